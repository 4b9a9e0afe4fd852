// Credential gate for gated deployments: a salted-hash store checked before
// the pipeline runs. Deliberately simple, not a hardened scheme.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fs;

use crate::pipeline::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub username: String,
    pub salt: String,
    /// Hex digest of sha256(salt + password).
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
}

pub fn read_store(path: &str) -> AnalysisResult<Vec<CredentialEntry>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let store: Vec<CredentialEntry> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(store)
}

pub fn hash_password(salt: &str, password: &str) -> String {
    sha256::digest(format!("{}{}", salt, password))
}

pub fn verify(store: &[CredentialEntry], username: &str, password: &str) -> bool {
    store
        .iter()
        .any(|e| e.username == username && e.password_hash == hash_password(&e.salt, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Vec<CredentialEntry> {
        vec![CredentialEntry {
            username: "ana".to_string(),
            salt: "s4lt".to_string(),
            password_hash: hash_password("s4lt", "secret"),
        }]
    }

    #[test]
    fn accepts_the_right_password() {
        assert!(verify(&store(), "ana", "secret"));
    }

    #[test]
    fn rejects_wrong_password_and_unknown_user() {
        assert!(!verify(&store(), "ana", "Secret"));
        assert!(!verify(&store(), "luis", "secret"));
        assert!(!verify(&[], "ana", "secret"));
    }

    #[test]
    fn hash_depends_on_the_salt() {
        assert_ne!(hash_password("a", "pw"), hash_password("b", "pw"));
    }
}
