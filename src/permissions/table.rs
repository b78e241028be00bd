use std::collections::BTreeMap;

use super::error::PermissionError;
use super::types::{AccessLevel, ColumnPermissions, RelationRole};
use crate::database::relations::{self, RelationDescriptor};

use AccessLevel::{None as NO, Read as RD, Write as WR};

/// Column permissions for one relation, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationPermissions {
    pub columns: Vec<(String, ColumnPermissions)>,
}

impl RelationPermissions {
    pub fn get(&self, column: &str) -> Option<&ColumnPermissions> {
        self.columns.iter().find(|(name, _)| name == column).map(|(_, p)| p)
    }

    fn entry(&mut self, column: &str) -> &mut ColumnPermissions {
        let position = match self.columns.iter().position(|(name, _)| name == column) {
            Some(position) => position,
            None => {
                self.columns.push((column.to_string(), ColumnPermissions::default()));
                self.columns.len() - 1
            }
        };
        &mut self.columns[position].1
    }
}

/// `{relation -> {column -> {role -> access level}}}`, immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    relations: BTreeMap<String, RelationPermissions>,
}

/// Problems found while checking a table against the relation descriptors.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// `relation.column` pairs with no entry at all (treated as NONE)
    pub missing: Vec<String>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one permission entry. A repeated (relation, column, role)
    /// keeps the most permissive level.
    pub fn insert(&mut self, relation: &str, column: &str, role: RelationRole, level: AccessLevel) {
        self.relations
            .entry(relation.to_string())
            .or_default()
            .entry(column)
            .grant(role, level);
    }

    pub fn insert_column(&mut self, relation: &str, column: &str, permissions: ColumnPermissions) {
        for role in RelationRole::ALL {
            self.insert(relation, column, role, permissions.level(role));
        }
    }

    pub fn relation(&self, relation: &str) -> Result<&RelationPermissions, PermissionError> {
        self.relations
            .get(relation)
            .ok_or_else(|| PermissionError::UnknownRelation(relation.to_string()))
    }

    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    /// Access level of one column for one role; absent entries are NONE.
    pub fn level(&self, relation: &str, column: &str, role: RelationRole) -> Result<AccessLevel, PermissionError> {
        Ok(self
            .relation(relation)?
            .get(column)
            .map(|p| p.level(role))
            .unwrap_or(AccessLevel::None))
    }

    /// Every relation and column in the table must exist in the static
    /// descriptors, since column names end up quoted into SQL.
    pub fn validate(&self) -> Result<ValidationReport, PermissionError> {
        let mut report = ValidationReport::default();
        for (relation_name, permissions) in &self.relations {
            let descriptor = relations::relation(relation_name)
                .ok_or_else(|| PermissionError::UnknownRelation(relation_name.clone()))?;
            for (column, _) in &permissions.columns {
                if !descriptor.has_column(column) {
                    return Err(PermissionError::UnknownColumn {
                        relation: relation_name.clone(),
                        column: column.clone(),
                    });
                }
            }
            for column in descriptor.column_names() {
                if permissions.get(column).is_none() {
                    report.missing.push(format!("{}.{}", relation_name, column));
                }
            }
        }
        for descriptor in relations::RELATIONS {
            if !self.relations.contains_key(descriptor.name) {
                report.missing.push(format!("{}.*", descriptor.name));
            }
        }
        Ok(report)
    }

    /// The table compiled into the binary.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for &(descriptor, grid) in BUILTIN {
            add_grid(&mut table, descriptor, grid);
        }
        table
    }
}

type Grid = &'static [(&'static str, AccessLevel, AccessLevel, AccessLevel)];

fn add_grid(table: &mut PermissionTable, descriptor: &RelationDescriptor, grid: Grid) {
    for &(column, standard, owner, admin) in grid {
        table.insert_column(descriptor.name, column, ColumnPermissions::new(standard, owner, admin));
    }
}

// column, STANDARD, OWNER, ADMIN
#[rustfmt::skip]
const AGENCIES_GRID: Grid = &[
    ("id",                      RD, RD, RD),
    ("name",                    RD, RD, WR),
    ("submitted_name",          RD, RD, WR),
    ("homepage_url",            RD, RD, WR),
    ("jurisdiction_type",       RD, RD, WR),
    ("agency_type",             RD, RD, WR),
    ("location_id",             RD, RD, WR),
    ("no_web_presence",         RD, RD, WR),
    ("defunct_year",            RD, RD, WR),
    ("multi_agency",            RD, RD, WR),
    ("approval_status",         RD, RD, WR),
    ("rejection_reason",        NO, NO, WR),
    ("last_approval_editor",    NO, NO, WR),
    ("submitter_contact",       NO, NO, WR),
    ("created_at",              RD, RD, RD),
    ("updated_at",              RD, RD, RD),
];

#[rustfmt::skip]
const DATA_SOURCES_GRID: Grid = &[
    ("id",                      RD, RD, RD),
    ("name",                    WR, WR, WR),
    ("description",             WR, WR, WR),
    ("source_url",              WR, WR, WR),
    ("agency_supplied",         WR, WR, WR),
    ("supplying_entity",        WR, WR, WR),
    ("agency_originated",       WR, WR, WR),
    ("agency_aggregation",      WR, WR, WR),
    ("coverage_start",          WR, WR, WR),
    ("coverage_end",            WR, WR, WR),
    ("detail_level",            WR, WR, WR),
    ("access_types",            WR, WR, WR),
    ("record_formats",          WR, WR, WR),
    ("update_method",           WR, WR, WR),
    ("retention_schedule",      WR, WR, WR),
    ("tags",                    WR, WR, WR),
    ("readme_url",              WR, WR, WR),
    ("originating_entity",      WR, WR, WR),
    ("scraper_url",             WR, WR, WR),
    ("access_notes",            WR, WR, WR),
    ("url_status",              RD, RD, WR),
    ("approval_status",         RD, RD, WR),
    ("submission_notes",        WR, WR, WR),
    ("rejection_note",          NO, NO, WR),
    ("last_approval_editor",    NO, NO, WR),
    ("submitter_contact_info",  NO, NO, WR),
    ("broken_source_url_as_of", RD, RD, WR),
    ("created_at",              RD, RD, RD),
    ("updated_at",              RD, RD, RD),
];

#[rustfmt::skip]
const DATA_REQUESTS_GRID: Grid = &[
    ("id",                       RD, RD, RD),
    ("title",                    WR, WR, WR),
    ("submission_notes",         WR, WR, WR),
    ("request_status",           RD, RD, WR),
    ("creator_user_id",          NO, RD, RD),
    ("date_created",             RD, RD, RD),
    ("date_status_last_changed", RD, RD, RD),
    ("internal_notes",           NO, NO, WR),
    ("record_types_required",    WR, WR, WR),
    ("pdap_prioritized",         NO, NO, WR),
    ("request_urgency",          WR, WR, WR),
    ("coverage_range",           WR, WR, WR),
    ("data_requirements",        WR, WR, WR),
    ("github_issue_url",         RD, RD, WR),
    ("github_issue_number",      RD, RD, WR),
];

#[rustfmt::skip]
const LOCATIONS_GRID: Grid = &[
    ("id",            RD, RD, RD),
    ("type",          RD, RD, WR),
    ("state_iso",     RD, RD, WR),
    ("state_name",    RD, RD, WR),
    ("county_fips",   RD, RD, WR),
    ("county_name",   RD, RD, WR),
    ("locality_name", RD, RD, WR),
    ("display_name",  RD, RD, WR),
    ("lat",           RD, RD, WR),
    ("lng",           RD, RD, WR),
];

#[rustfmt::skip]
const USERS_GRID: Grid = &[
    ("id",              RD, RD, RD),
    ("email",           NO, RD, RD),
    ("password_digest", NO, NO, NO),
    ("api_key",         NO, NO, NO),
    ("created_at",      NO, RD, RD),
    ("updated_at",      NO, RD, RD),
];

const BUILTIN: &[(&RelationDescriptor, Grid)] = &[
    (&relations::AGENCIES, AGENCIES_GRID),
    (&relations::DATA_SOURCES, DATA_SOURCES_GRID),
    (&relations::DATA_REQUESTS, DATA_REQUESTS_GRID),
    (&relations::LOCATIONS, LOCATIONS_GRID),
    (&relations::USERS, USERS_GRID),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_every_descriptor_column() {
        let table = PermissionTable::builtin();
        let report = table.validate().expect("builtin table must validate");
        assert!(report.missing.is_empty(), "missing entries: {:?}", report.missing);
    }

    #[test]
    fn absent_entries_are_none() {
        let mut table = PermissionTable::new();
        table.insert("agencies", "name", RelationRole::Admin, AccessLevel::Write);
        assert_eq!(table.level("agencies", "name", RelationRole::Admin).unwrap(), AccessLevel::Write);
        assert_eq!(table.level("agencies", "name", RelationRole::Standard).unwrap(), AccessLevel::None);
        assert_eq!(table.level("agencies", "homepage_url", RelationRole::Admin).unwrap(), AccessLevel::None);
        assert!(matches!(
            table.level("spaceships", "name", RelationRole::Admin),
            Err(PermissionError::UnknownRelation(_))
        ));
    }

    #[test]
    fn validate_rejects_columns_missing_from_descriptor() {
        let mut table = PermissionTable::new();
        table.insert("agencies", "name; DROP TABLE users", RelationRole::Admin, AccessLevel::Read);
        assert!(matches!(table.validate(), Err(PermissionError::UnknownColumn { .. })));

        let mut table = PermissionTable::new();
        table.insert("pg_shadow", "usename", RelationRole::Admin, AccessLevel::Read);
        assert!(matches!(table.validate(), Err(PermissionError::UnknownRelation(_))));
    }

    #[test]
    fn validate_reports_gaps_without_failing() {
        let mut table = PermissionTable::new();
        table.insert("locations", "id", RelationRole::Standard, AccessLevel::Read);
        let report = table.validate().unwrap();
        assert!(report.missing.contains(&"locations.display_name".to_string()));
        assert!(report.missing.contains(&"agencies.*".to_string()));
    }

    #[test]
    fn secrets_are_never_readable() {
        let table = PermissionTable::builtin();
        for role in RelationRole::ALL {
            assert_eq!(table.level("users", "password_digest", role).unwrap(), AccessLevel::None);
            assert_eq!(table.level("users", "api_key", role).unwrap(), AccessLevel::None);
        }
    }
}
