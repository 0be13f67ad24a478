//! Runtime settings, read from `YSC_*` environment variables.

use std::path::PathBuf;

use crate::instrumentation::LogFormat;

pub const DEFAULT_CDN_HOST: &str = "https://oakshiftsoftware.github.io/cdn/young-suns-companion";
pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:9100";
pub const DEFAULT_WORKERS: u8 = 2;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

pub const APP_NAME: &str = "Young Sun's Companion";
pub const APP_AUTHOR: &str = "Oakshift Software";
pub const APP_DESCRIPTION: &str = "Queue the things you want to build and see the resources \
    they need, where to find them, and how many you have collected.";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub cdn_host: String,
    pub blueprints_url: String,
    pub resources_url: String,
    pub cache_dir: PathBuf,
    pub listen_addr: String,
    pub workers: u8,
    pub fetch_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_: &str| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cdn_host = var("YSC_CDN_HOST")
            .map(|host| host.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_CDN_HOST.to_string());
        let blueprints_url =
            var("YSC_BLUEPRINTS_URL").unwrap_or_else(|| format!("{cdn_host}/blueprints.json"));
        let resources_url =
            var("YSC_RESOURCES_URL").unwrap_or_else(|| format!("{cdn_host}/resources.json"));

        let cache_dir = var("YSC_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));
        let listen_addr =
            var("YSC_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let workers = var("YSC_WORKERS")
            .and_then(|v| v.parse::<u8>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_WORKERS);
        let fetch_timeout_secs = var("YSC_FETCH_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);

        let log_format = var("YSC_LOG_FORMAT")
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Self {
            cdn_host,
            blueprints_url,
            resources_url,
            cache_dir,
            listen_addr,
            workers,
            fetch_timeout_secs,
            log_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.cdn_host, DEFAULT_CDN_HOST);
        assert_eq!(config.blueprints_url, format!("{DEFAULT_CDN_HOST}/blueprints.json"));
        assert_eq!(config.resources_url, format!("{DEFAULT_CDN_HOST}/resources.json"));
        assert_eq!(config.cache_dir, PathBuf::from("cache"));
        assert_eq!(config.listen_addr, "127.0.0.1:9100");
        assert_eq!(config.workers, 2);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_cdn_host_drives_urls() {
        let config = Config::from_lookup(lookup(&[
            ("YSC_CDN_HOST", "http://localhost:8000/"),
            ("YSC_RESOURCES_URL", "http://elsewhere/res.json"),
        ]));

        assert_eq!(config.blueprints_url, "http://localhost:8000/blueprints.json");
        assert_eq!(config.resources_url, "http://elsewhere/res.json");
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("YSC_WORKERS", "0"),
            ("YSC_FETCH_TIMEOUT_SECS", "soon"),
            ("YSC_LOG_FORMAT", "JSON"),
            ("YSC_CACHE_DIR", " "),
        ]));

        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
    }
}
