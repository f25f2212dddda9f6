use serde::Deserialize;

/// Complete Courier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub socket: SocketConfig,
}

/// Hub server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Publisher throttle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum seconds between accepted samples
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
    /// Minimum great-circle movement in meters between accepted samples
    #[serde(default = "default_min_distance_m")]
    pub min_distance_m: f64,
}

fn default_min_interval_secs() -> u64 {
    15
}

fn default_min_distance_m() -> f64 {
    20.0
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            min_distance_m: default_min_distance_m(),
        }
    }
}

/// Tracking consumer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Fixed order-snapshot polling interval (seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Network timeout for a single snapshot fetch (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Assumed courier speed for ETA computation (km/h)
    #[serde(default = "default_assumed_speed_kmph")]
    pub assumed_speed_kmph: f64,
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_assumed_speed_kmph() -> f64 {
    25.0
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            assumed_speed_kmph: default_assumed_speed_kmph(),
        }
    }
}

/// Socket client reconnect configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SocketConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    5000
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            throttle: ThrottleConfig::default(),
            tracking: TrackingConfig::default(),
            socket: SocketConfig::default(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<CourierConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: CourierConfig = toml::from_str(&contents)?;
    Ok(config)
}
