use reqwest::{Method, StatusCode};

use crate::api::client::EdgeClient;
use crate::error::{DeployError, DeployResult};
use crate::models::script::{ScriptEnvelope, ScriptRequest};

/// Error code the API sends alongside a 404 when a site script does not exist.
const SCRIPT_NOT_FOUND_CODE: i64 = 5;

/// Remote operations the deployer needs. Both return the server-assigned id.
#[allow(async_fn_in_trait)]
pub trait ScriptApi {
    async fn create_script(
        &self,
        stack_id: &str,
        site_id: &str,
        body: &ScriptRequest,
    ) -> DeployResult<String>;

    /// Fails with [`DeployError::StaleReference`] when `script_id` no longer exists.
    async fn update_script(
        &self,
        stack_id: &str,
        site_id: &str,
        script_id: &str,
        body: &ScriptRequest,
    ) -> DeployResult<String>;
}

impl ScriptApi for EdgeClient {
    async fn create_script(
        &self,
        stack_id: &str,
        site_id: &str,
        body: &ScriptRequest,
    ) -> DeployResult<String> {
        let resource = format!("/cdn/v1/stacks/{}/sites/{}/scripts", stack_id, site_id);

        let resp = self
            .send(Method::POST, &resource, Some(body))
            .await?
            .error_for_status()?;
        let envelope: ScriptEnvelope = resp.json()?;

        tracing::debug!(
            "Created script {} with id {} (version {})",
            body.name,
            envelope.script.id,
            envelope.script.version.as_deref().unwrap_or("unknown")
        );
        Ok(envelope.script.id)
    }

    async fn update_script(
        &self,
        stack_id: &str,
        site_id: &str,
        script_id: &str,
        body: &ScriptRequest,
    ) -> DeployResult<String> {
        let resource = format!(
            "/cdn/v1/stacks/{}/sites/{}/scripts/{}",
            stack_id, site_id, script_id
        );

        let resp = self.send(Method::PATCH, &resource, Some(body)).await?;

        if resp.status == StatusCode::NOT_FOUND
            && resp.error_code() == Some(SCRIPT_NOT_FOUND_CODE)
        {
            return Err(DeployError::StaleReference {
                id: script_id.to_string(),
            });
        }

        let envelope: ScriptEnvelope = resp.error_for_status()?.json()?;
        tracing::debug!(
            "Updated script {} with id {} (version {})",
            body.name,
            envelope.script.id,
            envelope.script.version.as_deref().unwrap_or("unknown")
        );
        Ok(envelope.script.id)
    }
}
