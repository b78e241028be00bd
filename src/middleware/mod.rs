pub mod auth;
pub mod response;

pub use auth::{access_info_middleware, parse_authorization, Credentials};
pub use response::{ApiResponse, ApiResult};
