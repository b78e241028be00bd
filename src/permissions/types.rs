use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::PermissionError;

/// Access a role has on a single column. `Write` implies `Read`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessLevel {
    #[default]
    None,
    Read,
    Write,
}

impl AccessLevel {
    /// Whether a column at this level satisfies a request for `requested`.
    pub fn grants(self, requested: AccessLevel) -> bool {
        match requested {
            AccessLevel::None => false,
            _ => self >= requested,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::None => "NONE",
            AccessLevel::Read => "READ",
            AccessLevel::Write => "WRITE",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(AccessLevel::None),
            "READ" => Ok(AccessLevel::Read),
            "WRITE" => Ok(AccessLevel::Write),
            _ => Err(PermissionError::UnknownAccessLevel(s.to_string())),
        }
    }
}

/// Role of a caller relative to a relation (and possibly one row of it).
/// Computed per request, never stored on the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationRole {
    Standard,
    Owner,
    Admin,
}

impl RelationRole {
    pub const ALL: [RelationRole; 3] = [RelationRole::Standard, RelationRole::Owner, RelationRole::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationRole::Standard => "STANDARD",
            RelationRole::Owner => "OWNER",
            RelationRole::Admin => "ADMIN",
        }
    }

    /// Role used for nested relations: ownership never carries over to
    /// rows of another relation.
    pub fn for_nested(self) -> RelationRole {
        match self {
            RelationRole::Owner => RelationRole::Standard,
            other => other,
        }
    }
}

impl fmt::Display for RelationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationRole {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(RelationRole::Standard),
            "OWNER" => Ok(RelationRole::Owner),
            "ADMIN" => Ok(RelationRole::Admin),
            _ => Err(PermissionError::UnknownRole(s.to_string())),
        }
    }
}

/// Named permission bits granted to users through `user_permissions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionBit {
    DbWrite,
    ReadAllUserInfo,
    Notifications,
    SourceCollector,
}

impl PermissionBit {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "db_write" => Some(PermissionBit::DbWrite),
            "read_all_user_info" => Some(PermissionBit::ReadAllUserInfo),
            "notifications" => Some(PermissionBit::Notifications),
            "source_collector" => Some(PermissionBit::SourceCollector),
            _ => None,
        }
    }
}

/// Per-role access for one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPermissions {
    #[serde(default)]
    pub standard: AccessLevel,
    #[serde(default)]
    pub owner: AccessLevel,
    #[serde(default)]
    pub admin: AccessLevel,
}

impl ColumnPermissions {
    pub const fn new(standard: AccessLevel, owner: AccessLevel, admin: AccessLevel) -> Self {
        Self { standard, owner, admin }
    }

    pub fn level(&self, role: RelationRole) -> AccessLevel {
        match role {
            RelationRole::Standard => self.standard,
            RelationRole::Owner => self.owner,
            RelationRole::Admin => self.admin,
        }
    }

    /// Raise the level for `role`; duplicate grants keep the most permissive one.
    pub fn grant(&mut self, role: RelationRole, level: AccessLevel) {
        let slot = match role {
            RelationRole::Standard => &mut self.standard,
            RelationRole::Owner => &mut self.owner,
            RelationRole::Admin => &mut self.admin,
        };
        if level > *slot {
            *slot = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_implies_read() {
        assert!(AccessLevel::Write.grants(AccessLevel::Read));
        assert!(AccessLevel::Write.grants(AccessLevel::Write));
        assert!(AccessLevel::Read.grants(AccessLevel::Read));
        assert!(!AccessLevel::Read.grants(AccessLevel::Write));
        assert!(!AccessLevel::None.grants(AccessLevel::Read));
        assert!(!AccessLevel::Write.grants(AccessLevel::None));
    }

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("admin".parse::<RelationRole>().unwrap(), RelationRole::Admin);
        assert_eq!(" Owner ".parse::<RelationRole>().unwrap(), RelationRole::Owner);
        assert!(matches!(
            "superuser".parse::<RelationRole>(),
            Err(PermissionError::UnknownRole(_))
        ));
    }

    #[test]
    fn grant_keeps_most_permissive_level() {
        let mut perms = ColumnPermissions::default();
        perms.grant(RelationRole::Standard, AccessLevel::Write);
        perms.grant(RelationRole::Standard, AccessLevel::Read);
        assert_eq!(perms.level(RelationRole::Standard), AccessLevel::Write);
        assert_eq!(perms.level(RelationRole::Admin), AccessLevel::None);
    }

    #[test]
    fn permission_bits_from_database_names() {
        assert_eq!(PermissionBit::from_name("db_write"), Some(PermissionBit::DbWrite));
        assert_eq!(PermissionBit::from_name("DB_WRITE"), Some(PermissionBit::DbWrite));
        assert_eq!(PermissionBit::from_name("launch_missiles"), None);
    }
}
