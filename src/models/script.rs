use serde::{Deserialize, Serialize};

/// Body of both the create and the update script calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptRequest {
    pub name: String,
    pub paths: Vec<String>,
    /// Base64-encoded script source.
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ScriptEnvelope {
    pub script: RemoteScript,
}

#[derive(Debug, Deserialize)]
pub struct RemoteScript {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
}
