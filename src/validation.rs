use std::path::Path;

use serde_json::Value;

use crate::error::{DeployError, DeployResult};
use crate::models::config::{CONFIG_FILE, id_text};

/// Check the raw configuration document, stopping at the first violation.
///
/// Runs before the document is converted into a [`Configuration`] so that a
/// malformed file gets a message naming the offending field rather than a
/// generic deserialization error. Script files are resolved against `base_dir`.
///
/// [`Configuration`]: crate::models::config::Configuration
pub fn validate_configuration(document: &Value, base_dir: &Path) -> DeployResult<()> {
    for field in ["stack_id", "site_id", "scripts"] {
        let value = document.get(field);
        if is_missing(value) {
            return Err(invalid(format!(
                "Missing required property '{}' in your {} file.",
                field, CONFIG_FILE
            )));
        }
        if field != "scripts" && value.and_then(id_text).is_none() {
            return Err(invalid(format!(
                "Property '{}' should be a string or a number.",
                field
            )));
        }
    }

    let Some(scripts) = document["scripts"].as_array() else {
        return Err(invalid("Property 'scripts' should be an array."));
    };

    for script in scripts {
        let name = script.get("name").and_then(Value::as_str).unwrap_or("");
        if name.is_empty() {
            return Err(invalid("At least one script is missing a valid name."));
        }

        let Some(paths) = script.get("paths").filter(|p| !p.is_null()) else {
            return Err(invalid(format!(
                "The script with name '{}' does not have a paths property.",
                name
            )));
        };

        if paths.as_array().is_none_or(|p| p.is_empty()) {
            return Err(invalid(format!(
                "The paths property of the script with name '{}' should contain at least one path.",
                name
            )));
        }

        if paths.as_array().is_some_and(|p| p.iter().any(|entry| !entry.is_string())) {
            return Err(invalid(format!(
                "The paths property of the script with name '{}' should only contain strings.",
                name
            )));
        }

        let file = script.get("file").and_then(Value::as_str).unwrap_or("");
        if file.is_empty() {
            return Err(invalid(format!(
                "The script with name '{}' does not contain a reference to its file.",
                name
            )));
        }

        if !base_dir.join(file).is_file() {
            return Err(invalid(format!(
                "The file ({}) of the script with name '{}' could not be found.",
                file, name
            )));
        }

        for field in ["id", "site_id", "stack_id"] {
            let value = script.get(field);
            if !is_missing(value) && value.and_then(id_text).is_none() {
                return Err(invalid(format!(
                    "Property '{}' of the script with name '{}' should be a string or a number.",
                    field, name
                )));
            }
        }
    }

    Ok(())
}

fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn invalid(message: impl Into<String>) -> DeployError {
    DeployError::Validation(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{TempDir, tempdir};

    fn fixture() -> (TempDir, Value) {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("one.js"), "console.log(1);").unwrap();
        std::fs::write(dir.path().join("two.js"), "console.log(2);").unwrap();

        let config = json!({
            "stack_id": "thestackid",
            "site_id": "thesiteid",
            "scripts": [
                {"id": "theid1", "name": "thename1", "paths": ["path1", "path2"], "file": "one.js"},
                {"id": "theid2", "name": "thename2", "paths": ["path3"], "file": "two.js", "site_id": "other"}
            ]
        });
        (dir, config)
    }

    fn error_for(config: &Value, dir: &TempDir) -> String {
        validate_configuration(config, dir.path())
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn accepts_valid_configuration() {
        let (dir, config) = fixture();
        validate_configuration(&config, dir.path()).unwrap();
    }

    #[test]
    fn stack_id_is_reported_before_site_id() {
        let (dir, mut config) = fixture();
        let obj = config.as_object_mut().unwrap();
        obj.remove("stack_id");
        obj.remove("site_id");

        let msg = error_for(&config, &dir);
        assert!(msg.contains("'stack_id'"), "{msg}");
    }

    #[test]
    fn null_counts_as_missing() {
        let (dir, mut config) = fixture();
        config["site_id"] = Value::Null;
        assert!(error_for(&config, &dir).contains("'site_id'"));
    }

    #[test]
    fn requires_scripts_array() {
        let (dir, mut config) = fixture();
        config.as_object_mut().unwrap().remove("scripts");
        assert!(error_for(&config, &dir).contains("'scripts'"));

        config["scripts"] = json!("astring");
        assert_eq!(
            error_for(&config, &dir),
            "Property 'scripts' should be an array."
        );
    }

    #[test]
    fn requires_script_name() {
        let (dir, mut config) = fixture();
        config["scripts"][0].as_object_mut().unwrap().remove("name");
        assert_eq!(
            error_for(&config, &dir),
            "At least one script is missing a valid name."
        );

        config["scripts"][0]["name"] = json!("");
        assert_eq!(
            error_for(&config, &dir),
            "At least one script is missing a valid name."
        );
    }

    #[test]
    fn requires_paths() {
        let (dir, mut config) = fixture();
        config["scripts"][0].as_object_mut().unwrap().remove("paths");
        assert!(error_for(&config, &dir).contains("'thename1' does not have a paths property"));
    }

    #[test]
    fn empty_paths_needs_at_least_one_path() {
        let (dir, mut config) = fixture();
        config["scripts"][1]["paths"] = json!([]);
        let msg = error_for(&config, &dir);
        assert!(msg.contains("'thename2'"));
        assert!(msg.contains("at least one path"));
    }

    #[test]
    fn requires_file_reference() {
        let (dir, mut config) = fixture();
        config["scripts"][0]["file"] = json!("");
        assert!(error_for(&config, &dir).contains("does not contain a reference to its file"));

        config["scripts"][0].as_object_mut().unwrap().remove("file");
        assert!(error_for(&config, &dir).contains("does not contain a reference to its file"));
    }

    #[test]
    fn referenced_file_must_exist() {
        let (dir, mut config) = fixture();
        config["scripts"][0]["file"] = json!("a-very-nonexisting-file.extension");
        assert_eq!(
            error_for(&config, &dir),
            "The file (a-very-nonexisting-file.extension) of the script with name 'thename1' could not be found."
        );
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let (dir, mut config) = fixture();
        config["stack_id"] = json!(1);
        config["site_id"] = json!(2);
        config["scripts"][0]["id"] = json!(3);
        config["scripts"][1]["site_id"] = json!(4);
        validate_configuration(&config, dir.path()).unwrap();
    }

    #[test]
    fn ids_must_be_strings_or_numbers() {
        let (dir, mut config) = fixture();
        config["stack_id"] = json!({"id": 1});
        config["site_id"] = json!(true);
        assert_eq!(
            error_for(&config, &dir),
            "Property 'stack_id' should be a string or a number."
        );

        let (dir, mut config) = fixture();
        config["scripts"][1]["stack_id"] = json!(["1"]);
        assert_eq!(
            error_for(&config, &dir),
            "Property 'stack_id' of the script with name 'thename2' should be a string or a number."
        );
    }

    #[test]
    fn paths_must_be_strings() {
        let (dir, mut config) = fixture();
        config["scripts"][0]["paths"] = json!(["path1", 2]);
        assert!(error_for(&config, &dir).contains("'thename1' should only contain strings"));
    }

    #[test]
    fn stops_at_first_invalid_script() {
        let (dir, mut config) = fixture();
        config["scripts"][0]["paths"] = json!([]);
        config["scripts"][1]["name"] = json!("");
        assert!(error_for(&config, &dir).contains("'thename1'"));
    }
}
