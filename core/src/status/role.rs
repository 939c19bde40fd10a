//! The role lattice: a coarse ordering over statuses shared by every
//! container type and every flow.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A coarse categorical label attached to a status. The four named roles are
/// the ones every default flow uses; `Custom` lets a flow introduce an
/// intermediate label without touching this enum. Roles serialize as their
/// plain string form (`"planning"`, `"review"`, or the custom name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Planning,
    Work,
    Review,
    Terminal,
    /// An application-defined role not in the fixed set above. Unknown roles
    /// always compare as below every named role (see `role_order`) — a flow
    /// that needs a custom role to sit between two named ones must be
    /// expressed as a named role, which this engine does not invent on its
    /// own: role ordering beyond the four named roles is left to the flow
    /// author, not guessed here.
    Custom(String),
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RoleVisitor;
        impl Visitor<'_> for RoleVisitor {
            type Value = Role;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a role name string")
            }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<Role, E> {
                Ok(Role::parse(v))
            }
        }
        deserializer.deserialize_str(RoleVisitor)
    }
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Planning => "planning",
            Role::Work => "work",
            Role::Review => "review",
            Role::Terminal => "terminal",
            Role::Custom(s) => s.as_str(),
        }
    }

    pub fn parse(s: &str) -> Role {
        match normalize(s).as_str() {
            "planning" => Role::Planning,
            "work" => Role::Work,
            "review" => Role::Review,
            "terminal" => Role::Terminal,
            other => Role::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercase-with-hyphens canonical external form.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace('_', "-")
}

/// Uppercase-with-underscores internal form.
pub fn denormalize(s: &str) -> String {
    s.trim().to_uppercase().replace('-', "_")
}

/// Total order over roles. Named roles use their fixed rank; an unrecognized
/// (`Custom`) role ranks below `Planning` so it never satisfies a named
/// threshold by accident — it is below terminal and, more conservatively,
/// below everything named.
pub fn role_order(role: &Role) -> i32 {
    match role {
        Role::Planning => 0,
        Role::Work => 1,
        Role::Review => 2,
        Role::Terminal => 3,
        Role::Custom(_) => -1,
    }
}

/// The single source of truth for role comparisons anywhere in the engine.
pub fn is_role_at_or_beyond(role: &Role, threshold: &Role) -> bool {
    role_order(role) >= role_order(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        for s in ["in_progress", "IN-PROGRESS", "In_Progress"] {
            let once = normalize(s);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn normalize_denormalize_round_trip_preserves_parse() {
        for s in ["in-progress", "IN_PROGRESS", "pending"] {
            let roundtrip = normalize(&denormalize(s));
            assert_eq!(Role::parse(&roundtrip), Role::parse(s));
        }
    }

    #[test]
    fn is_role_at_or_beyond_is_reflexive() {
        for role in [Role::Planning, Role::Work, Role::Review, Role::Terminal] {
            assert!(is_role_at_or_beyond(&role, &role));
        }
    }

    #[test]
    fn is_role_at_or_beyond_respects_total_order() {
        assert!(is_role_at_or_beyond(&Role::Terminal, &Role::Planning));
        assert!(!is_role_at_or_beyond(&Role::Planning, &Role::Work));
        assert!(is_role_at_or_beyond(&Role::Review, &Role::Work));
    }

    #[test]
    fn unknown_role_ranks_below_named_roles() {
        let custom = Role::Custom("triage".to_string());
        assert!(!is_role_at_or_beyond(&custom, &Role::Planning));
        assert!(!is_role_at_or_beyond(&custom, &Role::Terminal));
    }
}
