pub mod api_keys;
pub mod crud;
pub mod typeahead;

pub use api_keys::issue_api_key;
pub use crud::CrudContext;
