//! Session permission model.
//!
//! A membership holds a single current [`Permission`]; the authority
//! replaces it wholesale on a `permissionsChanged` event. Gating is done
//! through [`Capability`], where higher levels imply the lower ones.

use serde::{Deserialize, Serialize};

/// Permission level granted to a session member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    Read,
    Edit,
    Admin,
}

/// Flattened view of what a permission level allows.
///
/// `edit` implies `read`, `admin` implies `edit`. The default is the
/// no-grant capability (nothing allowed), used when no membership for
/// the active session is known yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capability {
    pub read: bool,
    pub edit: bool,
    pub admin: bool,
}

impl Permission {
    /// Compute the capability set for this permission level.
    pub fn capability(self) -> Capability {
        match self {
            Permission::Read => Capability {
                read: true,
                edit: false,
                admin: false,
            },
            Permission::Edit => Capability {
                read: true,
                edit: true,
                admin: false,
            },
            Permission::Admin => Capability {
                read: true,
                edit: true,
                admin: true,
            },
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Permission::Read => "READ",
            Permission::Edit => "EDIT",
            Permission::Admin => "ADMIN",
        };
        write!(f, "{}", s)
    }
}
