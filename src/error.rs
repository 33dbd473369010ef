use std::path::PathBuf;

use thiserror::Error;

pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Error, Debug)]
pub enum DeployError {
    /// A required file (credentials or project configuration) is absent.
    #[error("{hint} ({})", .path.display())]
    MissingFile { path: PathBuf, hint: String },

    #[error("The {} file does not contain valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Validation(String),

    #[error("An error occurred trying to retrieve an access token: {0}")]
    Auth(String),

    /// Non-success response from the API. `message` already embeds the request URL.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The script id recorded locally no longer exists server-side.
    #[error("Script with id {id} does not exist (anymore)")]
    StaleReference { id: String },

    #[error("An error occurred when connecting to host {host}")]
    Connection {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Operation canceled.")]
    UserCancelled,

    #[error("Script '{name}': {source}")]
    Script {
        name: String,
        #[source]
        source: Box<DeployError>,
    },

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read input: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl DeployError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the script name to an error raised while deploying it.
    pub fn for_script(self, name: &str) -> Self {
        match self {
            Self::UserCancelled | Self::Prompt(_) | Self::Script { .. } => self,
            other => Self::Script {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Errors that end the whole run instead of counting as one failed script.
    pub fn aborts_run(&self) -> bool {
        matches!(self, Self::UserCancelled | Self::Prompt(_))
    }
}
