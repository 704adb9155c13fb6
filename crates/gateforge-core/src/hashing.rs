// crates/gateforge-core/src/hashing.rs
// ============================================================================
// Module: GateForge Canonical Hashing
// Description: RFC 8785 JSON canonicalization and content hashing utilities.
// Purpose: Provide deterministic hashes for change-sets and artifact content.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Change-set hashes and content digests are computed over RFC 8785 (JCS)
//! canonical JSON so the same logical value always hashes identically
//! regardless of field insertion order, matching the determinism invariant
//! in Testable Property 3.

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// Errors raised when computing canonical hashes.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

/// Deterministic content hash, always SHA-256 over canonical JSON or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HashDigest(String);

impl HashDigest {
    /// Returns the lowercase hex-encoded digest value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HashDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes canonical JSON for a serializable value.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(&bytes))
}

/// Hashes raw bytes with SHA-256.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    HashDigest(hex_encode(&digest))
}

/// Hashes an ordered sequence of strings, e.g. the operation tuples of a
/// change-set, by joining with a newline separator before hashing.
#[must_use]
pub fn hash_ordered_strings<'a>(items: impl IntoIterator<Item = &'a str>) -> HashDigest {
    let joined = items.into_iter().collect::<Vec<_>>().join("\n");
    hash_bytes(joined.as_bytes())
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::hash_canonical_json;
    use super::hash_ordered_strings;

    #[test]
    fn field_order_does_not_affect_hash() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        let hash_a = hash_canonical_json(&a).map(|digest| digest.as_str().to_string());
        let hash_b = hash_canonical_json(&b).map(|digest| digest.as_str().to_string());
        assert_eq!(hash_a.ok(), hash_b.ok());
    }

    #[test]
    fn ordered_strings_hash_is_order_sensitive() {
        let forward = hash_ordered_strings(["a", "b"]);
        let backward = hash_ordered_strings(["b", "a"]);
        assert_ne!(forward.as_str(), backward.as_str());
    }
}
