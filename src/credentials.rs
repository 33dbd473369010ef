use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{DeployError, DeployResult};

const CREDENTIALS_HOME: &str = ".stackpath";
const CREDENTIALS_FILE: &str = "credentials";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Unix timestamp (seconds) after which `access_token` is no longer valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_expiry: Option<i64>,
}

impl Credentials {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            access_token: None,
            access_token_expiry: None,
        }
    }

    /// A token counts as expired when missing, when no expiry is recorded, or
    /// when the expiry is at or before `now`.
    pub fn is_token_expired(&self, now: i64) -> bool {
        match (self.access_token.as_deref(), self.access_token_expiry) {
            (Some(token), Some(expiry)) if !token.is_empty() => expiry <= now,
            _ => true,
        }
    }
}

/// Credentials persisted as JSON in a single owner-only file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.stackpath/credentials`
    pub fn default_location() -> DeployResult<Self> {
        let home = dirs::home_dir().ok_or_else(|| DeployError::MissingFile {
            path: PathBuf::from("~"),
            hint: "Could not determine the home directory.".to_string(),
        })?;
        Ok(Self::new(home.join(CREDENTIALS_HOME).join(CREDENTIALS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> DeployResult<Credentials> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DeployError::MissingFile {
                path: self.path.clone(),
                hint: "The credentials file does not exist yet. Run `edgeengine auth` to create it."
                    .to_string(),
            },
            _ => DeployError::io(&self.path, e),
        })?;

        serde_json::from_str(&contents).map_err(|source| DeployError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, credentials: &Credentials) -> DeployResult<()> {
        let json = serde_json::to_vec(credentials).map_err(|source| DeployError::Parse {
            path: self.path.clone(),
            source,
        })?;
        write_private(&self.path, &json)
    }
}

/// Atomically replace `path` with `contents`, restricting it to the owner on unix.
fn write_private(path: &Path, contents: &[u8]) -> DeployResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        tracing::debug!("{} does not exist. Creating directory.", parent.display());
        std::fs::create_dir_all(parent).map_err(|e| DeployError::io(parent, e))?;
    }

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| DeployError::io(parent, e))?;
    tmp.write_all(contents).map_err(|e| DeployError::io(path, e))?;

    // Rw for the owner only, set before the rename so the secret is never world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
            .map_err(|e| DeployError::io(path, e))?;
    }

    tmp.persist(path).map_err(|e| DeployError::io(path, e.error))?;
    Ok(())
}
