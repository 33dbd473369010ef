use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::api::scripts::ScriptApi;
use crate::error::{DeployError, DeployResult};
use crate::models::config::{CONFIG_FILE, Configuration, Script};
use crate::models::script::ScriptRequest;
use crate::prompt::Prompt;
use crate::validation::validate_configuration;

/// What happened to a single script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Recreated,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeploySummary {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub recreated: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

impl DeploySummary {
    fn record(&mut self, outcome: Outcome, name: &str) {
        let bucket = match outcome {
            Outcome::Created => &mut self.created,
            Outcome::Updated => &mut self.updated,
            Outcome::Recreated => &mut self.recreated,
        };
        bucket.push(name.to_string());
    }
}

impl fmt::Display for DeploySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = [
            ("Created", &self.created),
            ("Updated", &self.updated),
            ("Recreated", &self.recreated),
            ("Failed", &self.failed),
            ("Skipped", &self.skipped),
        ];
        for (label, names) in groups.iter().filter(|(_, names)| !names.is_empty()) {
            writeln!(f, "{} ({}):", label, names.len())?;
            for name in names.iter() {
                writeln!(f, "  - {}", name)?;
            }
        }
        Ok(())
    }
}

/// Reconciles the scripts of a project file with the remote API, one at a time.
pub struct Deployer<'a, A, P> {
    api: &'a A,
    prompt: &'a P,
    base_dir: PathBuf,
    only: Option<Vec<String>>,
}

impl<'a, A: ScriptApi, P: Prompt> Deployer<'a, A, P> {
    pub fn new(api: &'a A, prompt: &'a P, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            prompt,
            base_dir: base_dir.into(),
            only: None,
        }
    }

    /// Restrict the run to scripts with these names.
    pub fn only(mut self, names: Vec<String>) -> Self {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        self.only = (!names.is_empty()).then_some(names);
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    /// Load, validate, deploy every script and write the updated project file.
    ///
    /// The project file is only rewritten once all scripts have been handled;
    /// any error returned from here leaves it untouched.
    pub async fn deploy_scripts(&self) -> DeployResult<DeploySummary> {
        let path = self.config_path();

        tracing::debug!("Reading {} file contents.", CONFIG_FILE);
        let document = Configuration::read_document(&path)?;

        tracing::debug!("Validating {} file contents.", CONFIG_FILE);
        validate_configuration(&document, &self.base_dir)?;
        let mut config = Configuration::from_document(&path, document)?;

        let summary = self.deploy_all(&mut config).await?;

        tracing::debug!("Saving new configuration file to {}", CONFIG_FILE);
        config.save(&path)?;
        Ok(summary)
    }

    /// Run the per-script loop over an already validated configuration.
    pub async fn deploy_all(&self, config: &mut Configuration) -> DeployResult<DeploySummary> {
        self.warn_unmatched_filter(config);

        let Configuration {
            stack_id,
            site_id,
            scripts,
            ..
        } = config;
        let mut summary = DeploySummary::default();

        for script in scripts.iter_mut() {
            if !self.is_selected(&script.name) {
                tracing::debug!("Skipping script {}.", script.name);
                summary.skipped.push(script.name.clone());
                continue;
            }

            match self.deploy_script(stack_id.as_str(), site_id.as_str(), script).await {
                Ok(outcome) => summary.record(outcome, &script.name),
                Err(e) if e.aborts_run() => return Err(e),
                Err(e) => {
                    tracing::error!("{}", e);
                    summary.failed.push(script.name.clone());

                    let question = format!("An error has occurred ({}). Continue?", e);
                    if !self.prompt.confirm(&question, false)? {
                        tracing::info!("Exiting...");
                        return Err(DeployError::UserCancelled);
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Create or update one script, storing the server-assigned id on success.
    async fn deploy_script(
        &self,
        default_stack_id: &str,
        default_site_id: &str,
        script: &mut Script,
    ) -> DeployResult<Outcome> {
        let stack_id = script.effective_stack_id(default_stack_id).to_string();
        let site_id = script.effective_site_id(default_site_id).to_string();
        let body = self
            .build_request(script)
            .await
            .map_err(|e| e.for_script(&script.name))?;

        let Some(script_id) = script.remote_id().map(str::to_string) else {
            self.create(&stack_id, &site_id, script, &body).await?;
            return Ok(Outcome::Created);
        };

        tracing::debug!(
            "Updating script {} with id {} to site {}.",
            script.name,
            script_id,
            site_id
        );
        match self
            .api
            .update_script(&stack_id, &site_id, &script_id, &body)
            .await
        {
            Ok(id) => {
                script.id = Some(id);
                tracing::info!("Successfully updated script {}", script.name);
                Ok(Outcome::Updated)
            }
            Err(DeployError::StaleReference { .. }) => {
                tracing::debug!("Script {} does not exist (anymore).", script.name);
                let recreate = self.prompt.confirm(
                    "It seems your script does not exist (anymore). Recreate?",
                    true,
                )?;
                if !recreate {
                    return Err(DeployError::UserCancelled);
                }

                script.id = None;
                self.create(&stack_id, &site_id, script, &body).await?;
                Ok(Outcome::Recreated)
            }
            Err(e) => Err(e.for_script(&script.name)),
        }
    }

    async fn create(
        &self,
        stack_id: &str,
        site_id: &str,
        script: &mut Script,
        body: &ScriptRequest,
    ) -> DeployResult<()> {
        tracing::debug!("Creating script {} for site {}.", script.name, site_id);

        let id = self
            .api
            .create_script(stack_id, site_id, body)
            .await
            .map_err(|e| e.for_script(&script.name))?;

        tracing::debug!("Saving id {} for created script {}", id, script.name);
        script.id = Some(id);
        tracing::info!("Successfully created script {}", script.name);
        Ok(())
    }

    async fn build_request(&self, script: &Script) -> DeployResult<ScriptRequest> {
        let path = self.base_dir.join(&script.file);

        tracing::debug!("Reading script {}.", script.name);
        let source = tokio::fs::read(&path)
            .await
            .map_err(|e| DeployError::io(&path, e))?;

        Ok(ScriptRequest {
            name: script.name.clone(),
            paths: script.paths.clone(),
            code: STANDARD.encode(source),
        })
    }

    fn is_selected(&self, name: &str) -> bool {
        self.only
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == name))
    }

    fn warn_unmatched_filter(&self, config: &Configuration) {
        let Some(names) = &self.only else {
            return;
        };
        for name in names {
            if !config.scripts.iter().any(|s| &s.name == name) {
                tracing::warn!("No script named '{}' in {}.", name, CONFIG_FILE);
            }
        }
    }
}

/// Directory the project file is looked up in.
pub fn working_dir() -> DeployResult<PathBuf> {
    std::env::current_dir().map_err(|e| DeployError::io(Path::new("."), e))
}
