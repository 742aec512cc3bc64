use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EiflError, Result};
use crate::ids::SecretId;
use crate::timestamp::UtcTimestamp;

/// Secrets are attached either to a project (inherited by every repo under
/// it) or to a single repo (overriding a project-scoped secret of the same
/// name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretScope {
    Project,
    Repo,
}

impl fmt::Display for SecretScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Project => "project",
            Self::Repo => "repo",
        };
        write!(f, "{s}")
    }
}

/// `(scope, scope_id, name)` is unique. `name` must match
/// `^[A-Z][A-Z0-9_]*$`. `encrypted_value`/`iv` are both base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub id: SecretId,
    pub scope: SecretScope,
    pub scope_id: uuid::Uuid,
    pub name: String,
    pub encrypted_value: String,
    pub iv: String,
    pub created_at: UtcTimestamp,
    pub updated_at: UtcTimestamp,
}

/// Validate a secret name against `^[A-Z][A-Z0-9_]*$`.
pub fn validate_secret_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(EiflError::validation(
            "name",
            format!("`{name}` must match ^[A-Z][A-Z0-9_]*$"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        assert!(validate_secret_name("GITHUB_TOKEN").is_ok());
        assert!(validate_secret_name("A").is_ok());
        assert!(validate_secret_name("A1_B2").is_ok());
    }

    #[test]
    fn rejects_lowercase_or_leading_digit() {
        assert!(validate_secret_name("github_token").is_err());
        assert!(validate_secret_name("1TOKEN").is_err());
        assert!(validate_secret_name("").is_err());
        assert!(validate_secret_name("_TOKEN").is_err());
    }
}
