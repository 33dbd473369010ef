use anyhow::{Context, Result};

use crate::api::client::EdgeClient;
use crate::credentials::CredentialStore;
use crate::deploy::{self, Deployer};
use crate::prompt;
use crate::token;

pub async fn run(force: bool, only: Vec<String>) -> Result<()> {
    let store = CredentialStore::default_location()?;
    let client = EdgeClient::from_env(store);

    tracing::debug!("Checking if access token expired?");
    if token::is_access_token_expired(&client)? {
        println!("Refreshing access token...");
        token::get_access_token(&client)
            .await
            .context("Refreshing the access token failed")?;
        println!("Refreshing access token done.");
    } else {
        tracing::debug!("Access token is not expired.");
    }

    let prompt = prompt::for_mode(force);
    let base_dir = deploy::working_dir()?;

    println!("Deploying scripts...");
    let summary = Deployer::new(&client, &prompt, base_dir)
        .only(only)
        .deploy_scripts()
        .await?;

    print!("{}", summary);
    if summary.failed.is_empty() {
        println!("Deployment completed.");
    } else {
        println!(
            "Deployment completed with {} failed {}.",
            summary.failed.len(),
            if summary.failed.len() == 1 {
                "script"
            } else {
                "scripts"
            }
        );
    }

    Ok(())
}
