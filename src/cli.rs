//! Clap adapter.
//!
//! Compiled only with the `clap` feature (on by default). [`ConfigArgs`] embeds
//! into an application's `#[derive(Parser)]` to provide
//! `config list|gen|get|set`. [`ConfigArgs::into_action`] is the only bridge to
//! the core: it produces a [`ConfigAction`](crate::ConfigAction), which
//! [`Config::handle`](crate::Config::handle) executes. Applications with another
//! CLI parser construct `ConfigAction` values directly.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::ConfigAction;

/// Clap-derived args for the `config` subcommand group.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
///
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show every configuration key with its current value.
    List,
    /// Generate a commented configuration file holding the defaults.
    Gen {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the current value and comments for a key.
    Get {
        /// Dotted key path (e.g. "client.volume").
        key: String,
    },
    /// Set a value and save the config file.
    Set {
        /// Dotted key path (e.g. "client.volume").
        key: String,
        /// Value as TOML text; anything that does not parse is taken as a string.
        value: String,
    },
}

impl ConfigArgs {
    /// Bare `config` and `config list` both map to `ConfigAction::List`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List,
            Some(ConfigSubcommand::Gen { output }) => ConfigAction::Gen { output },
            Some(ConfigSubcommand::Get { key }) => ConfigAction::Get { key },
            Some(ConfigSubcommand::Set { key, value }) => ConfigAction::Set { key, value },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> ConfigAction {
        TestCli::try_parse_from(args).unwrap().config.into_action()
    }

    #[test]
    fn parse_gen() {
        assert_eq!(parse(&["test", "gen"]), ConfigAction::Gen { output: None });
        assert_eq!(
            parse(&["test", "gen", "-o", "out.toml"]),
            ConfigAction::Gen {
                output: Some(PathBuf::from("out.toml"))
            }
        );
        assert_eq!(
            parse(&["test", "gen", "--output", "/etc/app/main.toml"]),
            ConfigAction::Gen {
                output: Some(PathBuf::from("/etc/app/main.toml"))
            }
        );
    }

    #[test]
    fn parse_get() {
        assert_eq!(
            parse(&["test", "get", "client.volume"]),
            ConfigAction::Get {
                key: "client.volume".into()
            }
        );
    }

    #[test]
    fn parse_set() {
        assert_eq!(
            parse(&["test", "set", "tags", "[\"a\", \"b\"]"]),
            ConfigAction::Set {
                key: "tags".into(),
                value: "[\"a\", \"b\"]".into(),
            }
        );
    }

    #[test]
    fn parse_bare_config_is_list() {
        assert_eq!(parse(&["test"]), ConfigAction::List);
        assert_eq!(parse(&["test", "list"]), ConfigAction::List);
    }

    #[test]
    fn invalid_subcommand_errors() {
        assert!(TestCli::try_parse_from(["test", "nope"]).is_err());
        assert!(TestCli::try_parse_from(["test", "set", "port"]).is_err());
    }
}
