//! Static descriptors for every relation the CRUD layer may touch.
//!
//! Identifiers embedded into SQL (table and column names) must come from
//! here; user input is only ever matched against these lists.

use crate::query::QueryError;

/// One column of a relation and the SQL type bound parameters are cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: &'static str,
    pub sql_type: &'static str,
}

impl ColumnDescriptor {
    pub fn is_array(&self) -> bool {
        self.sql_type.ends_with("[]")
    }
}

const fn col(name: &'static str, sql_type: &'static str) -> ColumnDescriptor {
    ColumnDescriptor { name, sql_type }
}

/// Relation reachable from another through a many-to-many link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedRelation {
    /// Key used in responses and in `linked_ids` request bodies
    pub name: &'static str,
    /// Target relation
    pub relation: &'static str,
    pub link_table: &'static str,
    /// Link column pointing back at the parent row
    pub link_parent_column: &'static str,
    /// Link column pointing at the target row
    pub link_target_column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub name: &'static str,
    pub id_column: &'static str,
    /// Column holding the user id that owns a row, if rows have owners
    pub owner_column: Option<&'static str>,
    pub columns: &'static [ColumnDescriptor],
    pub nested: &'static [NestedRelation],
}

impl RelationDescriptor {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&'static ColumnDescriptor, QueryError> {
        self.column(name).ok_or_else(|| QueryError::UnknownColumn {
            relation: self.name.to_string(),
            column: name.to_string(),
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn nested(&self, name: &str) -> Option<&'static NestedRelation> {
        self.nested.iter().find(|n| n.name == name)
    }
}

pub const AGENCIES: RelationDescriptor = RelationDescriptor {
    name: "agencies",
    id_column: "id",
    owner_column: None,
    columns: &[
        col("id", "integer"),
        col("name", "text"),
        col("submitted_name", "text"),
        col("homepage_url", "text"),
        col("jurisdiction_type", "jurisdiction_type"),
        col("agency_type", "agency_type"),
        col("location_id", "integer"),
        col("no_web_presence", "boolean"),
        col("defunct_year", "text"),
        col("multi_agency", "boolean"),
        col("approval_status", "approval_status"),
        col("rejection_reason", "text"),
        col("last_approval_editor", "text"),
        col("submitter_contact", "text"),
        col("created_at", "timestamptz"),
        col("updated_at", "timestamptz"),
    ],
    nested: &[NestedRelation {
        name: "data_sources",
        relation: "data_sources",
        link_table: "link_agencies_data_sources",
        link_parent_column: "agency_id",
        link_target_column: "data_source_id",
    }],
};

pub const DATA_SOURCES: RelationDescriptor = RelationDescriptor {
    name: "data_sources",
    id_column: "id",
    owner_column: None,
    columns: &[
        col("id", "integer"),
        col("name", "text"),
        col("description", "text"),
        col("source_url", "text"),
        col("agency_supplied", "boolean"),
        col("supplying_entity", "text"),
        col("agency_originated", "boolean"),
        col("agency_aggregation", "agency_aggregation"),
        col("coverage_start", "date"),
        col("coverage_end", "date"),
        col("detail_level", "detail_level"),
        col("access_types", "access_type[]"),
        col("record_formats", "text[]"),
        col("update_method", "update_method"),
        col("retention_schedule", "retention_schedule"),
        col("tags", "text[]"),
        col("readme_url", "text"),
        col("originating_entity", "text"),
        col("scraper_url", "text"),
        col("access_notes", "text"),
        col("url_status", "url_status"),
        col("approval_status", "approval_status"),
        col("submission_notes", "text"),
        col("rejection_note", "text"),
        col("last_approval_editor", "text"),
        col("submitter_contact_info", "text"),
        col("broken_source_url_as_of", "date"),
        col("created_at", "timestamptz"),
        col("updated_at", "timestamptz"),
    ],
    nested: &[NestedRelation {
        name: "agencies",
        relation: "agencies",
        link_table: "link_agencies_data_sources",
        link_parent_column: "data_source_id",
        link_target_column: "agency_id",
    }],
};

pub const DATA_REQUESTS: RelationDescriptor = RelationDescriptor {
    name: "data_requests",
    id_column: "id",
    owner_column: Some("creator_user_id"),
    columns: &[
        col("id", "integer"),
        col("title", "text"),
        col("submission_notes", "text"),
        col("request_status", "request_status"),
        col("creator_user_id", "integer"),
        col("date_created", "timestamptz"),
        col("date_status_last_changed", "timestamptz"),
        col("internal_notes", "text"),
        col("record_types_required", "text[]"),
        col("pdap_prioritized", "boolean"),
        col("request_urgency", "request_urgency"),
        col("coverage_range", "text"),
        col("data_requirements", "text"),
        col("github_issue_url", "text"),
        col("github_issue_number", "integer"),
    ],
    nested: &[NestedRelation {
        name: "locations",
        relation: "locations",
        link_table: "link_locations_data_requests",
        link_parent_column: "data_request_id",
        link_target_column: "location_id",
    }],
};

pub const LOCATIONS: RelationDescriptor = RelationDescriptor {
    name: "locations",
    id_column: "id",
    owner_column: None,
    columns: &[
        col("id", "integer"),
        col("type", "location_type"),
        col("state_iso", "text"),
        col("state_name", "text"),
        col("county_fips", "text"),
        col("county_name", "text"),
        col("locality_name", "text"),
        col("display_name", "text"),
        col("lat", "double precision"),
        col("lng", "double precision"),
    ],
    nested: &[],
};

pub const USERS: RelationDescriptor = RelationDescriptor {
    name: "users",
    id_column: "id",
    owner_column: Some("id"),
    columns: &[
        col("id", "integer"),
        col("email", "text"),
        col("password_digest", "text"),
        col("api_key", "text"),
        col("created_at", "timestamptz"),
        col("updated_at", "timestamptz"),
    ],
    nested: &[],
};

pub static RELATIONS: &[RelationDescriptor] = &[AGENCIES, DATA_SOURCES, DATA_REQUESTS, LOCATIONS, USERS];

pub fn relation(name: &str) -> Option<&'static RelationDescriptor> {
    RELATIONS.iter().find(|r| r.name == name)
}

pub fn require_relation(name: &str) -> Result<&'static RelationDescriptor, QueryError> {
    relation(name).ok_or_else(|| QueryError::UnknownRelation(name.to_string()))
}
