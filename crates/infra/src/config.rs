//! Configuration loading and representation.
//!
//! Values come from the environment; command-line flags override them at the
//! binary boundary.

use std::path::PathBuf;

pub const ENV_STORE: &str = "BILLFIX_STORE";
pub const ENV_RECEIPT_DIR: &str = "BILLFIX_RECEIPT_DIR";
pub const ENV_ARTIFACT_DIR: &str = "BILLFIX_ARTIFACT_DIR";

const DEFAULT_STORE: &str = "billfix-store.json";
const ARTIFACT_SUBDIR: &str = "invoice-documents";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// JSON document backing the store.
    pub store_path: PathBuf,
    /// Directory receipts are written to.
    pub receipt_dir: PathBuf,
    /// Directory regenerated invoice documents are written to.
    pub artifact_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (blank values count as unset).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        let store_path = get(ENV_STORE).unwrap_or_else(|| PathBuf::from(DEFAULT_STORE));
        let receipt_dir = get(ENV_RECEIPT_DIR).unwrap_or_else(std::env::temp_dir);
        let artifact_dir = get(ENV_ARTIFACT_DIR).unwrap_or_else(|| receipt_dir.join(ARTIFACT_SUBDIR));

        Self {
            store_path,
            receipt_dir,
            artifact_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings.store_path, PathBuf::from("billfix-store.json"));
        assert_eq!(settings.receipt_dir, std::env::temp_dir());
        assert_eq!(settings.artifact_dir, std::env::temp_dir().join("invoice-documents"));
    }

    #[test]
    fn artifact_dir_follows_receipt_dir_unless_set() {
        let settings = Settings::from_lookup(lookup(&[(ENV_RECEIPT_DIR, "/var/receipts")]));
        assert_eq!(settings.artifact_dir, PathBuf::from("/var/receipts/invoice-documents"));

        let settings = Settings::from_lookup(lookup(&[
            (ENV_RECEIPT_DIR, "/var/receipts"),
            (ENV_ARTIFACT_DIR, "/srv/docs"),
            (ENV_STORE, "  "),
        ]));
        assert_eq!(settings.artifact_dir, PathBuf::from("/srv/docs"));
        assert_eq!(settings.store_path, PathBuf::from("billfix-store.json"));
    }
}
