//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "graceful-service")]
#[command(about = "An HTTP listener and a cron scheduler, drained together on shutdown")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Cadence of the periodic job (five-field cron, @daily, @every 30s, ...)
    #[arg(long, default_value = "* * * * *")]
    pub cron: String,

    /// Seconds each subsystem gets to drain on shutdown
    #[arg(long, default_value = "30")]
    pub shutdown_timeout: u64,

    /// Seconds the default handler waits before responding
    #[arg(long, default_value = "0")]
    pub response_delay: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_secs(self.response_delay)
    }

    /// Settings the coordinator needs
    pub fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            listen_address: self.address(),
            cron_expression: self.cron.clone(),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout),
        }
    }
}

/// Coordinator settings supplied by the embedding application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub listen_address: String,
    pub cron_expression: String,
    /// Drain window shared by every subsystem
    pub shutdown_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_string(),
            cron_expression: "* * * * *".to_string(),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}
