//! Roles and permission bits
//!
//! A role is a named bundle of permissions assignable to a user at creation
//! time. The console never interprets permission bits; it resolves a role
//! name to a [`Permissions`] value and hands it to the user store unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::console::RoleResolver;

/// Permission names recognized in role definitions, with their bit values.
pub const PERMISSION_NAMES: &[(&str, u64)] = &[
    ("hear_modcall", 1 << 0),
    ("kick", 1 << 1),
    ("ban", 1 << 2),
    ("mute", 1 << 3),
    ("get_logs", 1 << 4),
    ("modify_users", 1 << 5),
    ("bypass_locks", 1 << 6),
    ("announce", 1 << 7),
];

/// The special permission name granting every bit.
pub const PERMISSION_ADMIN: &str = "admin";

/// Opaque permission bitset carried by a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u64);

impl Permissions {
    /// No permissions.
    pub const NONE: Permissions = Permissions(0);

    /// Every defined permission bit.
    pub fn all() -> Permissions {
        Permissions(PERMISSION_NAMES.iter().fold(0, |acc, (_, bit)| acc | bit))
    }

    /// Build a bitset from named permissions.
    ///
    /// `admin` expands to every bit. Unknown names are an error.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Permissions, RoleError> {
        let mut bits = 0u64;
        for name in names {
            let name = name.as_ref();
            if name == PERMISSION_ADMIN {
                bits |= Permissions::all().0;
                continue;
            }
            match PERMISSION_NAMES.iter().find(|(n, _)| *n == name) {
                Some((_, bit)) => bits |= bit,
                None => return Err(RoleError::UnknownPermission(name.to_string())),
            }
        }
        Ok(Permissions(bits))
    }

    /// Check whether every bit of `other` is present.
    pub fn contains(&self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit value, for storage.
    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Rebuild from a stored bit value.
    pub fn from_bits(bits: u64) -> Permissions {
        Permissions(bits)
    }
}

/// Errors from role definition and lookup.
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    #[error("duplicate role: {0}")]
    DuplicateRole(String),
}

/// A role as it appears in the server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDef {
    pub name: String,

    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Role table: resolves role names to permission bitsets.
///
/// Built once from configuration at startup; lookups are exact-match.
#[derive(Debug, Default)]
pub struct RoleTable {
    roles: HashMap<String, Permissions>,
}

impl RoleTable {
    pub fn from_defs(defs: &[RoleDef]) -> Result<RoleTable, RoleError> {
        let mut roles = HashMap::new();
        for def in defs {
            let perms = Permissions::from_names(&def.permissions)?;
            if roles.insert(def.name.clone(), perms).is_some() {
                return Err(RoleError::DuplicateRole(def.name.clone()));
            }
        }
        Ok(RoleTable { roles })
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleResolver for RoleTable {
    fn resolve(&self, role_name: &str) -> Result<Permissions, RoleError> {
        self.roles
            .get(role_name)
            .copied()
            .ok_or_else(|| RoleError::UnknownRole(role_name.to_string()))
    }
}
