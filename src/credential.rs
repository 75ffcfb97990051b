//! Loading the bearer token the run authenticates with.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_AUTH_FILE: &str = "/tmp/auth.json";
pub const TOKEN_ENV: &str = "TASKPROBE_TOKEN";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(
        "{file} not found. Run authentication first:\n  \
         aws cognito-idp initiate-auth \\\n    \
         --client-id <app-client-id> \\\n    \
         --auth-flow USER_PASSWORD_AUTH \\\n    \
         --auth-parameters USERNAME=<email>,PASSWORD=<password> \\\n    \
         > {file}\n\
         or pass a token with --token / {env}",
        file = .path.display(),
        env = TOKEN_ENV
    )]
    Missing { path: PathBuf },

    #[error("reading {file}: {source}", file = .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} is not a Cognito initiate-auth response: {source}", file = .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{file} contains an empty IdToken", file = .path.display())]
    Empty { path: PathBuf },
}

#[derive(Deserialize)]
struct AuthFile {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: AuthenticationResult,
}

#[derive(Deserialize)]
struct AuthenticationResult {
    #[serde(rename = "IdToken")]
    id_token: String,
}

/// Where the run's credential comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Token given directly on the command line or in the environment.
    Token(String),
    /// Saved `aws cognito-idp initiate-auth` output.
    AuthFile(PathBuf),
}

impl CredentialSource {
    /// Prefer an explicit non-empty token, otherwise fall back to `auth_file`.
    pub fn select(token: Option<String>, auth_file: PathBuf) -> Self {
        match token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            Some(token) => Self::Token(token),
            None => Self::AuthFile(auth_file),
        }
    }

    pub async fn load(&self) -> Result<String, CredentialError> {
        match self {
            Self::Token(token) => Ok(token.clone()),
            Self::AuthFile(path) => load_auth_file(path).await,
        }
    }
}

/// Read `AuthenticationResult.IdToken` from a saved initiate-auth response.
pub async fn load_auth_file(path: &Path) -> Result<String, CredentialError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(CredentialError::Missing {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(CredentialError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let parsed: AuthFile =
        serde_json::from_str(&contents).map_err(|source| CredentialError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let token = parsed.authentication_result.id_token.trim().to_string();
    if token.is_empty() {
        return Err(CredentialError::Empty {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!(path = %path.display(), length = token.len(), "loaded credential");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn load_auth_file_reads_id_token() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("auth.json");
        std::fs::write(
            &path,
            r#"{"AuthenticationResult":{"IdToken":"eyJ.id","AccessToken":"eyJ.access","ExpiresIn":3600}}"#,
        )
        .unwrap();

        assert_eq!(load_auth_file(&path).await.unwrap(), "eyJ.id");
    }

    #[tokio::test]
    async fn missing_file_explains_how_to_authenticate() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("auth.json");

        let err = load_auth_file(&path).await.unwrap_err();
        assert!(matches!(err, CredentialError::Missing { .. }));
        let message = err.to_string();
        assert!(message.contains("auth.json not found"));
        assert!(message.contains("aws cognito-idp initiate-auth"));
        assert!(message.contains(TOKEN_ENV));
    }

    #[tokio::test]
    async fn malformed_and_empty_files_are_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("auth.json");

        std::fs::write(&path, r#"{"ChallengeName":"NEW_PASSWORD_REQUIRED"}"#).unwrap();
        let err = load_auth_file(&path).await.unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));

        std::fs::write(&path, r#"{"AuthenticationResult":{"IdToken":"  "}}"#).unwrap();
        let err = load_auth_file(&path).await.unwrap_err();
        assert!(matches!(err, CredentialError::Empty { .. }));
    }

    #[tokio::test]
    async fn explicit_token_wins_over_auth_file() {
        let source = CredentialSource::select(
            Some(" tok ".to_string()),
            PathBuf::from("/nonexistent/auth.json"),
        );
        assert_eq!(source, CredentialSource::Token("tok".to_string()));
        assert_eq!(source.load().await.unwrap(), "tok");

        let fallback = CredentialSource::select(Some(String::new()), PathBuf::from("a.json"));
        assert_eq!(fallback, CredentialSource::AuthFile(PathBuf::from("a.json")));
    }
}
