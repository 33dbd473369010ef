use dialoguer::{Confirm, Input, Password};

use crate::error::DeployResult;

/// Yes/no decisions the deployer needs from the operator.
pub trait Prompt {
    fn confirm(&self, message: &str, default: bool) -> DeployResult<bool>;
}

/// Interactive terminal prompt.
pub struct Terminal;

impl Prompt for Terminal {
    fn confirm(&self, message: &str, default: bool) -> DeployResult<bool> {
        Ok(Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()?)
    }
}

/// Force mode: every question is answered with yes.
pub struct AlwaysYes;

impl Prompt for AlwaysYes {
    fn confirm(&self, message: &str, _default: bool) -> DeployResult<bool> {
        tracing::debug!("{} (forced: yes)", message);
        Ok(true)
    }
}

pub fn for_mode(force: bool) -> Box<dyn Prompt> {
    if force {
        Box::new(AlwaysYes)
    } else {
        Box::new(Terminal)
    }
}

impl<P: Prompt + ?Sized> Prompt for Box<P> {
    fn confirm(&self, message: &str, default: bool) -> DeployResult<bool> {
        (**self).confirm(message, default)
    }
}

pub fn input(label: &str) -> DeployResult<String> {
    Ok(Input::<String>::new().with_prompt(label).interact_text()?)
}

pub fn secret(label: &str) -> DeployResult<String> {
    Ok(Password::new().with_prompt(label).interact()?)
}
