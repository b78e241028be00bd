use crate::database::relations::{self, RelationDescriptor};
use crate::permissions::RelationRole;
use crate::query::QueryError;

/// Extra role gate applied before an update or delete.
pub type RolePredicate = fn(RelationRole) -> bool;

/// How one governed relation is exposed over HTTP.
#[derive(Debug, Clone, Copy)]
pub struct ResourceConfig {
    pub relation: &'static str,
    /// Singular label used in messages, e.g. "Agency".
    pub entry_name: &'static str,
    pub plural_name: &'static str,
    /// Column the server fills with the caller's user id on insert.
    pub creator_column: Option<&'static str>,
    /// Columns accepted as equality filters on list requests.
    pub filterable: &'static [&'static str],
    pub update_check: Option<RolePredicate>,
    pub delete_check: Option<RolePredicate>,
}

impl ResourceConfig {
    pub fn descriptor(&self) -> Result<&'static RelationDescriptor, QueryError> {
        relations::require_relation(self.relation)
    }
}

pub fn owner_or_admin(role: RelationRole) -> bool {
    matches!(role, RelationRole::Owner | RelationRole::Admin)
}

pub fn admin_only(role: RelationRole) -> bool {
    role == RelationRole::Admin
}

pub const AGENCIES: ResourceConfig = ResourceConfig {
    relation: "agencies",
    entry_name: "Agency",
    plural_name: "Agencies",
    creator_column: None,
    filterable: &["approval_status", "jurisdiction_type", "agency_type", "location_id"],
    update_check: Some(admin_only),
    delete_check: Some(admin_only),
};

pub const DATA_SOURCES: ResourceConfig = ResourceConfig {
    relation: "data_sources",
    entry_name: "Data source",
    plural_name: "Data sources",
    creator_column: None,
    filterable: &["approval_status", "url_status", "agency_supplied"],
    update_check: Some(admin_only),
    delete_check: Some(admin_only),
};

pub const DATA_REQUESTS: ResourceConfig = ResourceConfig {
    relation: "data_requests",
    entry_name: "Data request",
    plural_name: "Data requests",
    creator_column: Some("creator_user_id"),
    filterable: &["request_status", "request_urgency"],
    update_check: Some(owner_or_admin),
    delete_check: Some(owner_or_admin),
};

pub const LOCATIONS: ResourceConfig = ResourceConfig {
    relation: "locations",
    entry_name: "Location",
    plural_name: "Locations",
    creator_column: None,
    filterable: &["type", "state_iso", "county_fips"],
    update_check: Some(admin_only),
    delete_check: Some(admin_only),
};

pub const USERS: ResourceConfig = ResourceConfig {
    relation: "users",
    entry_name: "User",
    plural_name: "Users",
    creator_column: None,
    filterable: &[],
    update_check: None,
    delete_check: None,
};
