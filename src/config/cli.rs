use std::path::PathBuf;

use clap::{builder::BoolishValueParser, ArgAction, Parser};

use super::Settings;

/// Upload a single file to a remote host over SCP.
#[derive(Parser)]
#[command(version)]
pub struct Args {
    /// Remote host, optionally with `:port`
    #[arg(long, env = "PLUGIN_ADDRESS", default_value = "")]
    pub address: String,

    #[arg(long, env = "PLUGIN_USERNAME", default_value = "")]
    pub username: String,

    #[arg(long, env = "PLUGIN_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Private key text (PEM or OpenSSH format)
    #[arg(long, env = "PLUGIN_KEY", default_value = "", hide_env_values = true)]
    pub key: String,

    /// Local file to upload
    #[arg(long, env = "PLUGIN_SOURCE", default_value = "")]
    pub source: String,

    /// Remote path, defaults to the file name of the source
    #[arg(long, env = "PLUGIN_TARGET", default_value = "")]
    pub target: String,

    /// Render the source as a template against the environment
    #[arg(
        long,
        env = "PLUGIN_TEMPLATING",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
    )]
    pub templating: bool,

    /// YAML file with the same keys as the flags; flags take precedence
    #[arg(long, env = "PLUGIN_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn into_settings(self) -> Settings {
        Settings {
            address: self.address,
            username: self.username,
            password: self.password,
            key: self.key,
            source: self.source,
            target: self.target,
            templating: self.templating,
            ..Default::default()
        }
    }
}
