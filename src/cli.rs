use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "edgeengine")]
#[command(about = "Deploy edge scripts to StackPath sites")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure the API credentials and fetch an access token
    Auth {
        /// Client ID used to authenticate with
        #[arg(short = 'c', long = "client_id", env = "STACKPATH_CLIENT_ID")]
        client_id: Option<String>,

        /// Client secret used to authenticate with
        #[arg(
            short = 's',
            long = "client_secret",
            env = "STACKPATH_CLIENT_SECRET",
            hide_env_values = true
        )]
        client_secret: Option<String>,

        /// Overwrite an existing credentials file without asking
        #[arg(
            short,
            long,
            env = "STACKPATH_FORCE",
            action = ArgAction::SetTrue,
            value_parser = BoolishValueParser::new()
        )]
        force: bool,

        /// Turn on verbose logging
        #[arg(
            short,
            long,
            env = "STACKPATH_LOG_LEVEL",
            action = ArgAction::SetTrue,
            value_parser = parse_log_level
        )]
        verbose: bool,
    },

    /// Deploy the scripts listed in .edgeengine.json in the working directory
    Deploy {
        /// Never prompt: recreate missing scripts and continue after errors
        #[arg(
            short,
            long,
            env = "STACKPATH_FORCE",
            action = ArgAction::SetTrue,
            value_parser = BoolishValueParser::new()
        )]
        force: bool,

        /// Turn on verbose logging
        #[arg(
            short,
            long,
            env = "STACKPATH_LOG_LEVEL",
            action = ArgAction::SetTrue,
            value_parser = parse_log_level
        )]
        verbose: bool,

        /// Only deploy the scripts with these names (comma-separated)
        #[arg(short, long, env = "STACKPATH_ONLY", value_delimiter = ',')]
        only: Vec<String>,
    },
}

impl Commands {
    pub fn verbose(&self) -> bool {
        match self {
            Commands::Auth { verbose, .. } | Commands::Deploy { verbose, .. } => *verbose,
        }
    }
}

/// `STACKPATH_LOG_LEVEL=verbose` turns on verbose logging; any other level leaves it off.
/// Also receives clap's own `true`/`false` for the bare flag.
fn parse_log_level(level: &str) -> Result<bool, String> {
    Ok(matches!(
        level.trim().to_ascii_lowercase().as_str(),
        "verbose" | "debug" | "true" | "1" | "yes" | "on"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auth_short_flags() {
        let cli =
            Cli::try_parse_from(["edgeengine", "auth", "-f", "-c", "id", "-s", "secret"]).unwrap();
        match cli.command {
            Commands::Auth {
                client_id,
                client_secret,
                force,
                ..
            } => {
                assert_eq!(client_id.as_deref(), Some("id"));
                assert_eq!(client_secret.as_deref(), Some("secret"));
                assert!(force);
            }
            _ => panic!("expected auth"),
        }
    }

    #[test]
    fn splits_only_on_commas() {
        let cli = Cli::try_parse_from(["edgeengine", "deploy", "-v", "--only", "a,b"]).unwrap();
        match cli.command {
            Commands::Deploy { only, verbose, .. } => {
                assert_eq!(only, vec!["a", "b"]);
                assert!(verbose);
            }
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn log_level_values() {
        assert_eq!(parse_log_level("verbose"), Ok(true));
        assert_eq!(parse_log_level("VERBOSE"), Ok(true));
        assert_eq!(parse_log_level("true"), Ok(true));
        assert_eq!(parse_log_level("info"), Ok(false));
        assert_eq!(parse_log_level("false"), Ok(false));
        assert_eq!(parse_log_level(""), Ok(false));
    }

    #[test]
    fn reads_force_and_log_level_from_env() {
        // Only this test sets these variables.
        unsafe {
            std::env::set_var("STACKPATH_FORCE", "1");
            std::env::set_var("STACKPATH_LOG_LEVEL", "verbose");
        }
        let deploy = Cli::try_parse_from(["edgeengine", "deploy"]);
        let auth = Cli::try_parse_from(["edgeengine", "auth"]);
        unsafe {
            std::env::remove_var("STACKPATH_FORCE");
            std::env::remove_var("STACKPATH_LOG_LEVEL");
        }

        for cli in [deploy.unwrap(), auth.unwrap()] {
            assert!(cli.command.verbose());
            match cli.command {
                Commands::Auth { force, .. } | Commands::Deploy { force, .. } => assert!(force),
            }
        }

        let cli = Cli::try_parse_from(["edgeengine", "deploy"]).unwrap();
        assert!(!cli.command.verbose());
    }
}
