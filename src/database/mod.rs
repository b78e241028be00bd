pub mod client;
pub mod dynamic;
pub mod relations;
pub mod users;

pub use client::{DatabaseClient, DatabaseError};
pub use dynamic::RelationOwnership;
pub use relations::{relation, require_relation, NestedRelation, RelationDescriptor};
