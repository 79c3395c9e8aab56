use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "agentdesk", version, about = "Agentdesk session CLI")]
pub struct Cli {
    /// Backend base address; overrides the runtime config file.
    #[arg(long, global = true, env = "AGENTDESK_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the persisted session.
    #[arg(long, global = true, env = "AGENTDESK_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore the persisted session and print it.
    Status {
        /// Print the signed-in user as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Sign in with username and password.
    Login {
        #[arg(long, env = "AGENTDESK_USERNAME")]
        username: String,

        #[arg(long, env = "AGENTDESK_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        ip_address: Option<String>,

        /// Path to return to after signing in.
        #[arg(long)]
        return_to: Option<String>,
    },

    /// Sign out and clear the persisted session.
    Logout,

    /// Keep the session under revalidation until Ctrl-C or expiry.
    Watch,

    /// Print version.
    Version,
}
