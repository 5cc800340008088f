//! CLI module for memberhub
//!
//! Provides command-line interface parsing for the memberhub-server binary.
//! Uses clap for argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable holding the password for `create-admin`.
pub const ADMIN_PASSWORD_ENV: &str = "MEMBERHUB_ADMIN_PASSWORD";

/// memberhub - identity and session authorization server
#[derive(Parser, Debug)]
#[command(
    name = "memberhub-server",
    version,
    about = "memberhub - identity and session authorization server",
    long_about = "Accounts, login sessions and role-gated administration for a student\n\
                  membership site.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  memberhub-server                          # Start the server (requires memberhub.toml)\n    \
                  memberhub-server --config my.toml         # Use a custom config file\n    \
                  memberhub-server purge-sessions           # Remove expired session rows\n    \
                  MEMBERHUB_ADMIN_PASSWORD=... memberhub-server create-admin --email a@b.c --name Admin"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "memberhub.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (the default)
    Serve,

    /// Delete session rows whose expiry has passed
    PurgeSessions,

    /// Create an administrator account
    ///
    /// The password is read from the MEMBERHUB_ADMIN_PASSWORD environment
    /// variable so it never appears in shell history.
    CreateAdmin {
        /// Email address of the new admin
        #[arg(long)]
        email: String,

        /// Display name of the new admin
        #[arg(long)]
        name: String,

        /// Admin password
        #[arg(long = "password", env = ADMIN_PASSWORD_ENV, hide_env_values = true, hide = true)]
        password: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults() {
        let cli = Cli::try_parse_from(["memberhub-server"]).expect("should parse");

        assert_eq!(cli.config, PathBuf::from("memberhub.toml"));
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["memberhub-server", "purge-sessions", "-c", "other.toml", "-v"])
            .expect("should parse");

        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(cli.verbose);
        assert_eq!(cli.command, Some(Commands::PurgeSessions));
    }

    #[test]
    fn test_create_admin_takes_password_flag() {
        let cli = Cli::try_parse_from([
            "memberhub-server",
            "create-admin",
            "--email",
            "root@example.com",
            "--name",
            "Root",
            "--password",
            "hunter22",
        ])
        .expect("should parse");

        match cli.command {
            Some(Commands::CreateAdmin {
                email,
                name,
                password,
            }) => {
                assert_eq!(email, "root@example.com");
                assert_eq!(name, "Root");
                assert_eq!(password, "hunter22");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_create_admin_requires_email() {
        let result = Cli::try_parse_from(["memberhub-server", "create-admin", "--name", "Root"]);
        assert!(result.is_err());
    }
}
