use std::path::PathBuf;

use clap::{Parser, Subcommand};
use schannel_shared::user_config::ProxyScheme;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(
        short = 's',
        long = "stdout",
        action,
        help = "Controls if it logs to stdout/stderr instead of to a file"
    )]
    pub is_to_std_out: bool,

    #[arg(
        long,
        help = "Directory for the config, credentials and traces (defaults to the platform config directory)"
    )]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lists the users that logged in on this machine
    Users,
    /// Deletes the saved password of a user but keeps the user
    Forget { username: String },
    /// Deletes a user and their saved password
    Remove { username: String },
    /// Shows or edits the user config
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    Show,
    /// Routes portal traffic through a proxy
    SetProxy {
        #[arg(long, default_value_t)]
        scheme: ProxyScheme,
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u16,
        #[arg(long, requires = "password")]
        username: Option<String>,
        #[arg(long, requires = "username")]
        password: Option<String>,
    },
    ClearProxy,
    /// Forgets the selected node, the first node is picked on the next refresh
    ClearNode,
}
