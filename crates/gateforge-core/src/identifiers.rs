// crates/gateforge-core/src/identifiers.rs
// ============================================================================
// Module: GateForge Identifiers
// Description: Canonical opaque identifiers for proposals, runs, and reviews.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque, serialize as plain strings on the wire, and carry
//! no validation beyond non-emptiness checks performed at the artifact
//! boundary. Keeping them as distinct types prevents accidentally mixing a
//! `ProposalId` with a `RunId` at a call site.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

macro_rules! string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(ProposalId, "Proposal identifier, stable across all artifacts derived from it.");
string_id!(RunId, "Run identifier assigned to one backend execution.");
string_id!(ReviewId, "Review resolution identifier.");
string_id!(PolicyProfileName, "Policy profile name, e.g. `default` or `industrial_strict`.");
string_id!(CheckerName, "Registered checker name in the checker suite.");
string_id!(PackId, "Repair-batch pack identifier.");

#[cfg(test)]
mod tests {
    use super::ProposalId;

    #[test]
    fn displays_as_inner_string() {
        let id = ProposalId::new("prop-1");
        assert_eq!(id.as_str(), "prop-1");
        assert_eq!(id.to_string(), "prop-1");
    }

    #[test]
    fn equal_ids_compare_equal() {
        assert_eq!(ProposalId::from("a"), ProposalId::from("a".to_string()));
    }
}
