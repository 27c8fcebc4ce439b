use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address (default: 0.0.0.0:8086)
    pub bind_addr: String,

    /// Capacity of the ingress queue in front of the supervisor (default: 1000)
    pub ingress_capacity: usize,

    /// Capacity of each actor mailbox (default: 10)
    pub mailbox_capacity: usize,

    /// Actor heartbeat period in seconds (default: 60)
    pub heartbeat_interval_secs: u64,

    /// An actor without a heartbeat for this long is considered dead (default: 300)
    pub actor_alive_window_secs: u64,

    /// An actor with no processed action for this long reports idle (default: 60)
    pub actor_idle_window_secs: u64,

    /// Resend API key for email delivery
    pub resend_api_key: String,

    /// Resend API base URL
    pub resend_api_url: String,

    /// Twilio messages endpoint
    pub twilio_url: String,

    /// Twilio account SID
    pub twilio_account_sid: String,

    /// Twilio auth token
    pub twilio_auth_token: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bind_addr: std::env::var("RELAY_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8086".to_string()),
            ingress_capacity: std::env::var("INGRESS_CAPACITY")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("INGRESS_CAPACITY must be a valid usize"))?,
            mailbox_capacity: std::env::var("MAILBOX_CAPACITY")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAILBOX_CAPACITY must be a valid usize"))?,
            heartbeat_interval_secs: std::env::var("HEARTBEAT_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HEARTBEAT_INTERVAL_SECS must be a valid u64"))?,
            actor_alive_window_secs: std::env::var("ACTOR_ALIVE_WINDOW_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ACTOR_ALIVE_WINDOW_SECS must be a valid u64"))?,
            actor_idle_window_secs: std::env::var("ACTOR_IDLE_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ACTOR_IDLE_WINDOW_SECS must be a valid u64"))?,
            resend_api_key: std::env::var("RESEND_API_KEY")
                .map_err(|_| anyhow::anyhow!("RESEND_API_KEY environment variable is required"))?,
            resend_api_url: std::env::var("RESEND_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            twilio_url: std::env::var("TWILIO_URL")
                .map_err(|_| anyhow::anyhow!("TWILIO_URL environment variable is required"))?,
            twilio_account_sid: std::env::var("TWILIO_ACCOUNT_SID").map_err(|_| {
                anyhow::anyhow!("TWILIO_ACCOUNT_SID environment variable is required")
            })?,
            twilio_auth_token: std::env::var("TWILIO_AUTH_TOKEN").map_err(|_| {
                anyhow::anyhow!("TWILIO_AUTH_TOKEN environment variable is required")
            })?,
        })
        .and_then(Self::validate)
    }

    /// Reject zero capacities, periods and windows; a zero-capacity queue can
    /// never accept work and a zero alive window marks every actor dead.
    fn validate(self) -> anyhow::Result<Self> {
        if self.ingress_capacity == 0 {
            anyhow::bail!("INGRESS_CAPACITY must be greater than zero");
        }
        if self.mailbox_capacity == 0 {
            anyhow::bail!("MAILBOX_CAPACITY must be greater than zero");
        }
        if self.heartbeat_interval_secs == 0 {
            anyhow::bail!("HEARTBEAT_INTERVAL_SECS must be greater than zero");
        }
        if self.actor_alive_window_secs == 0 {
            anyhow::bail!("ACTOR_ALIVE_WINDOW_SECS must be greater than zero");
        }
        if self.actor_idle_window_secs == 0 {
            anyhow::bail!("ACTOR_IDLE_WINDOW_SECS must be greater than zero");
        }
        if self.actor_alive_window_secs < self.heartbeat_interval_secs {
            tracing::warn!(
                alive_window = self.actor_alive_window_secs,
                heartbeat = self.heartbeat_interval_secs,
                "Alive window is shorter than the heartbeat period; actors will flap dead"
            );
        }
        Ok(self)
    }
}
