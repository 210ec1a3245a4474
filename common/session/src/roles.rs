use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Privilege levels, lowest first. Comparisons go through [`Role::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Technician,
    Admin,
    SuperAdmin,
}

pub const ROLE_HIERARCHY: &[Role] = &[Role::Customer, Role::Technician, Role::Admin, Role::SuperAdmin];

impl Role {
    pub const fn rank(self) -> u8 {
        match self {
            Role::Customer => 0,
            Role::Technician => 1,
            Role::Admin => 2,
            Role::SuperAdmin => 3,
        }
    }

    /// True when this role meets or exceeds `required`.
    pub const fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Technician => "TECHNICIAN",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "CUSTOMER" => Ok(Role::Customer),
            "TECHNICIAN" => Ok(Role::Technician),
            "ADMIN" => Ok(Role::Admin),
            "SUPER_ADMIN" | "SUPERADMIN" => Ok(Role::SuperAdmin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
