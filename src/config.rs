use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "fastnet-lite")]
#[command(about = "WiFi voucher sales backend")]
#[command(version)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://fastnet.db")]
    pub database_url: String,

    /// ISO currency code sent to the checkout widget
    #[arg(long, env = "CURRENCY", default_value = "XOF")]
    pub currency: String,

    /// Country code attached to buyer phone numbers
    #[arg(long, env = "COUNTRY_CODE", default_value = "bj")]
    pub country_code: String,

    /// Checkout provider environment ("sandbox" or "live")
    #[arg(long, env = "PROVIDER_ENV", default_value = "sandbox")]
    pub provider_env: String,

    /// Minutes a payment may stay in processing before it is cancelled
    #[arg(long, env = "PROCESSING_TIMEOUT_MINS", default_value = "30")]
    pub processing_timeout_mins: i64,

    /// Seconds between two sweeps of stale checkouts
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value = "60")]
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn processing_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.processing_timeout_mins)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["fastnet-lite"]);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
        assert_eq!(config.currency, "XOF");
        assert_eq!(config.processing_timeout(), chrono::Duration::minutes(30));
    }

    #[test]
    fn test_zero_interval_clamped() {
        let config = Config::parse_from(["fastnet-lite", "--sweep-interval-secs", "0"]);
        assert_eq!(config.sweep_interval(), std::time::Duration::from_secs(1));
    }
}
