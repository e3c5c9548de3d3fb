//! Storage key derivation.
//!
//! Every record this crate writes lives under a namespaced key so entries
//! can never collide with unrelated storage content and can be identified
//! in bulk. The format is compatibility-relevant: drop-in replacements must
//! reproduce it exactly.

/// Fixed namespace prefix for all storage keys.
pub const STORAGE_PREFIX: &str = "react-hook-form-persist";

/// Derive the storage key for a logical form name.
pub fn storage_key(name: &str) -> String {
    format!("{}:{}", STORAGE_PREFIX, name)
}
