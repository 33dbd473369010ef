use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{DeployError, DeployResult};

pub const CONFIG_FILE: &str = ".edgeengine.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Configuration {
    #[serde(deserialize_with = "string_or_number")]
    pub stack_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub site_id: String,
    pub scripts: Vec<Script>,
    /// The document as read from disk; saving writes it back with only the ids changed.
    #[serde(skip)]
    document: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    pub name: String,
    pub paths: Vec<String>,
    pub file: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub site_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub stack_id: Option<String>,
}

/// Ids may be written either as `"3"` or as `3`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

/// Text of an id-like JSON value, `None` for anything but strings and numbers.
pub fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Script {
    /// The server-assigned id, treating an empty string as never deployed.
    pub fn remote_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// The script's own `site_id`, or `default` when unset or empty.
    pub fn effective_site_id<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(self.site_id.as_deref()).unwrap_or(default)
    }

    pub fn effective_stack_id<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(self.stack_id.as_deref()).unwrap_or(default)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl Configuration {
    /// Read the raw JSON document without interpreting its shape.
    pub fn read_document(path: &Path) -> DeployResult<Value> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DeployError::MissingFile {
                path: path.to_path_buf(),
                hint: format!(
                    "The current directory does not contain the required {} file.",
                    CONFIG_FILE
                ),
            },
            _ => DeployError::io(path, e),
        })?;

        serde_json::from_str(&contents).map_err(|source| DeployError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_document(path: &Path, document: Value) -> DeployResult<Self> {
        let mut config =
            Configuration::deserialize(&document).map_err(|source| DeployError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.document = document;
        Ok(config)
    }

    /// The original document with each script's current id written in.
    ///
    /// Keys keep their input order. A newly assigned id is appended to its
    /// script object; an unchanged id is left exactly as written, number or string.
    pub fn to_document(&self) -> Value {
        let mut document = self.document.clone();
        let Some(entries) = document.get_mut("scripts").and_then(Value::as_array_mut) else {
            return document;
        };

        for (entry, script) in entries.iter_mut().zip(&self.scripts) {
            let Some(entry) = entry.as_object_mut() else {
                continue;
            };
            let current = entry.get("id").and_then(id_text).filter(|id| !id.is_empty());

            match (script.remote_id(), current) {
                (Some(id), Some(current)) if id == current => {}
                (Some(id), _) => {
                    entry.insert("id".to_string(), Value::String(id.to_string()));
                }
                (None, Some(_)) => {
                    entry.shift_remove("id");
                }
                (None, None) => {}
            }
        }
        document
    }

    /// Pretty-printed with a four-space indent and a trailing newline.
    pub fn to_pretty_json(&self) -> DeployResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.to_document()
            .serialize(&mut ser)
            .map_err(|source| DeployError::Parse {
                path: CONFIG_FILE.into(),
                source,
            })?;
        buf.push(b'\n');
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Replace the file at `path` in one step: the old content stays intact
    /// until the new content is fully written.
    pub fn save(&self, path: &Path) -> DeployResult<()> {
        let json = self.to_pretty_json()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| DeployError::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| DeployError::io(path, e))?;
        // Temp files are created owner-only; keep whatever mode the project file had.
        if let Ok(meta) = std::fs::metadata(path) {
            std::fs::set_permissions(tmp.path(), meta.permissions())
                .map_err(|e| DeployError::io(path, e))?;
        }
        tmp.persist(path).map_err(|e| DeployError::io(path, e.error))?;
        Ok(())
    }
}
