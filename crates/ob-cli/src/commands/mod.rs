//! CLI command implementations — a handful of read-only/demonstration
//! commands against the gateway's plain HTTP API (§6.4), not a full mc/aws
//! cli command surface (an explicit Non-goal, §1).

pub mod cat;
pub mod head;
pub mod info;
pub mod ls;
pub mod mb;
pub mod rb;
pub mod rm;

use crate::client::GatewayClient;
use crate::config::Config;

/// Context passed to all commands.
pub struct CommandContext {
    pub client: GatewayClient,
    pub json: bool,
    pub quiet: bool,
}

impl CommandContext {
    pub fn new(config: &Config, json: bool, quiet: bool) -> Self {
        Self { client: GatewayClient::new(config), json, quiet }
    }

    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg);
    }
}
