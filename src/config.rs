//! Configuration for the Mabratech API
//!
//! CLI arguments with environment variable fallbacks, using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Mabratech API - backend for the PT Mabra Technology Solutions website
#[derive(Parser, Debug, Clone)]
#[command(name = "mabratech-api")]
#[command(about = "Content, contact and analytics API for the Mabratech website")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8001")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGO_URL", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "DB_NAME", default_value = "mabratech")]
    pub mongodb_db: String,

    /// Enable development mode (in-memory store when MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// HTTP mail relay endpoint; notifications are only logged when unset
    #[arg(long, env = "MAIL_RELAY_URL")]
    pub mail_relay_url: Option<String>,

    /// Bearer token for the mail relay
    #[arg(long, env = "MAIL_API_KEY")]
    pub mail_api_key: Option<String>,

    /// Sender address for outgoing mail
    #[arg(long, env = "MAIL_FROM")]
    pub mail_from: Option<String>,

    /// Recipient of new-contact alerts
    #[arg(long, env = "ADMIN_EMAIL", default_value = "info@mabratech.co.id")]
    pub admin_email: String,

    /// Pending notification/analytics items before new ones are dropped
    #[arg(long, env = "SIDE_EFFECT_QUEUE_SIZE", default_value = "256")]
    pub side_effect_queue_size: usize,

    /// Trailing window for dashboard page-view counts, in days
    #[arg(long, env = "ANALYTICS_WINDOW_DAYS", default_value = "30")]
    pub analytics_window_days: u32,

    /// Copy the built-in catalog into empty collections at startup
    #[arg(long, env = "SEED_CONTENT", default_value = "false")]
    pub seed_content: bool,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.side_effect_queue_size == 0 {
            return Err("SIDE_EFFECT_QUEUE_SIZE must be at least 1".to_string());
        }

        if self.analytics_window_days == 0 {
            return Err("ANALYTICS_WINDOW_DAYS must be at least 1".to_string());
        }

        if self.mail_relay_url.is_some() && self.mail_from.is_none() {
            return Err("MAIL_FROM is required when MAIL_RELAY_URL is set".to_string());
        }

        Ok(())
    }
}
