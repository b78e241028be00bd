pub mod error;
pub mod resolver;
pub mod role;
pub mod source;
pub mod table;
pub mod types;

pub use error::PermissionError;
pub use resolver::{check_has_permission_to_edit_columns, permitted_columns, resolve_read_columns};
pub use role::{get_relation_role, role_without_resource, OwnershipLookup};
pub use table::PermissionTable;
pub use types::{AccessLevel, ColumnPermissions, PermissionBit, RelationRole};
