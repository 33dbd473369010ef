use anyhow::{Context, Result, bail};

use crate::api::client::EdgeClient;
use crate::credentials::{CredentialStore, Credentials};
use crate::prompt::{self, Prompt, Terminal};
use crate::token;

pub async fn run(client_id: Option<&str>, client_secret: Option<&str>, force: bool) -> Result<()> {
    let store = CredentialStore::default_location()?;

    tracing::debug!("Checking if credentials file exists");
    if store.exists() && !force {
        let overwrite = Terminal.confirm(
            "It seems a credentials file already exists. Continuing will overwrite its values. Continue?",
            false,
        )?;
        if !overwrite {
            bail!("Aborting...");
        }
        tracing::debug!("Credentials file will be overwritten. Continuing...");
    }

    let client_id = match client_id {
        Some(id) => id.to_string(),
        None => prompt::input("StackPath Client ID")?,
    };
    let client_secret = match client_secret {
        Some(secret) => secret.to_string(),
        None => prompt::secret("StackPath Client Secret")?,
    };

    tracing::debug!("Saving credentials to {}", store.path().display());
    store
        .save(&Credentials::new(&client_id, &client_secret))
        .context("Failed to save credentials")?;

    println!("Getting access token...");
    let client = EdgeClient::from_env(store);
    token::get_access_token(&client).await?;
    println!("Received access token.");

    println!("Your credentials have been configured.");
    Ok(())
}
