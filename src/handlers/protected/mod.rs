// handlers/protected/mod.rs - Endpoints behind the access info middleware.
// Every handler here can extract `Extension<AccessInfo>`.

pub mod permissions;
pub mod resource;
pub mod typeahead;
pub mod user;

pub use resource::{Agencies, DataRequests, DataSources, Locations, Resource, Users};
