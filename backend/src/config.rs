use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the read API listens on.
    pub bind_addr: String,

    /// Directory holding the per-market activity files.
    pub data_dir: PathBuf,

    // =========================
    // Exchange endpoints
    // =========================
    /// Base URL of the spot REST API (`/exchangeInfo`, `/ticker/24hr` are appended).
    pub spot_api_url: String,

    /// Base URL of the derivatives REST API.
    pub futures_api_url: String,

    /// Per-request timeout for outbound HTTP calls.
    pub http_timeout: Duration,

    // =========================
    // Task cadence
    // =========================
    /// How often the tradable symbol set is re-fetched for each market.
    pub symbol_refresh_every: Duration,

    /// How often latest prices are polled and compared against the windows.
    pub detect_every: Duration,

    /// How often expired events are dropped from both activity logs.
    pub purge_every: Duration,

    /// Maximum age of an activity event before purge removes it.
    pub retention: Duration,

    // =========================
    // Detection
    // =========================
    /// Number of samples kept per symbol.
    ///
    /// With the default 10s cadence, 30 samples cover the trailing five minutes.
    pub window_len: usize,

    /// Derivatives tickers whose close time is older than this are treated
    /// as stale or delisted and skipped.
    pub stale_contract_after: Duration,

    /// Symbols held to the tighter threshold band.
    pub major_assets: Vec<String>,

    /// Half-width of the major-asset band, in percent.
    pub major_band_pct: f64,

    /// Half-width of the band every symbol is checked against, in percent.
    pub general_band_pct: f64,

    /// Spot symbols that are never tracked.
    pub spot_blacklist: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            data_dir: PathBuf::from("."),

            spot_api_url: "https://api.binance.com/api/v3".to_string(),
            futures_api_url: "https://fapi.binance.com/fapi/v1".to_string(),
            http_timeout: Duration::from_secs(10),

            symbol_refresh_every: Duration::from_secs(300),
            detect_every: Duration::from_secs(10),
            purge_every: Duration::from_secs(300),
            retention: Duration::from_secs(86_400),

            window_len: 30,
            stale_contract_after: Duration::from_secs(1_800),
            major_assets: ["BTC", "ETH", "USDT", "XAU", "XAG"]
                .into_iter()
                .map(String::from)
                .collect(),
            major_band_pct: 1.0,
            general_band_pct: 3.0,
            spot_blacklist: vec!["BTTC".to_string()],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing keys keep their
    /// defaults; unparseable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();

        let secs = |key: &str, fallback: Duration| {
            parse_or(&lookup, key, fallback.as_secs()).max(1)
        };

        let pct = |key: &str, fallback: f64| {
            let v = parse_or(&lookup, key, fallback);
            if v.is_finite() && v > 0.0 && v < 100.0 {
                v
            } else {
                warn!(key, value = v, "band percentage out of range; using default");
                fallback
            }
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(d.bind_addr),
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(d.data_dir),

            spot_api_url: lookup("SPOT_API_URL").unwrap_or(d.spot_api_url),
            futures_api_url: lookup("FUTURES_API_URL").unwrap_or(d.futures_api_url),
            http_timeout: Duration::from_secs(secs("HTTP_TIMEOUT_SECS", d.http_timeout)),

            symbol_refresh_every: Duration::from_secs(secs(
                "SYMBOL_REFRESH_SECS",
                d.symbol_refresh_every,
            )),
            detect_every: Duration::from_secs(secs("DETECT_INTERVAL_SECS", d.detect_every)),
            purge_every: Duration::from_secs(secs("PURGE_INTERVAL_SECS", d.purge_every)),
            retention: Duration::from_secs(secs("RETENTION_SECS", d.retention)),

            window_len: parse_or(&lookup, "WINDOW_LEN", d.window_len).max(1),
            stale_contract_after: Duration::from_secs(secs(
                "STALE_CONTRACT_SECS",
                d.stale_contract_after,
            )),
            major_assets: lookup("MAJOR_ASSETS")
                .map(|v| split_list(&v))
                .unwrap_or(d.major_assets),
            major_band_pct: pct("MAJOR_BAND_PCT", d.major_band_pct),
            general_band_pct: pct("GENERAL_BAND_PCT", d.general_band_pct),
            spot_blacklist: lookup("SPOT_BLACKLIST")
                .map(|v| split_list(&v))
                .unwrap_or(d.spot_blacklist),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        self.bind_addr
            .parse()
            .map_err(|e| AppError::Config(format!("BIND_ADDR {:?}: {}", self.bind_addr, e)))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, fallback: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => fallback,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(key, value = %raw, "ignoring unparseable config value");
                fallback
            }
        },
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
