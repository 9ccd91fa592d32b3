/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, APP_ENV, HSTS_* など)
 * - HSTS_* は filter parameter (hsts.enable など) に詰め替えて渡す
 * - 値の解釈 (bool/int) は middleware::hsts 側で行う
 * - body limit / timeout (REQUEST_BODY_LIMIT_BYTES, REQUEST_TIMEOUT_SECS)
 */
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::middleware::hsts::{self, FilterParams};
use crate::middleware::http::{self, HttpLimits};

/// Environment variables that feed the HSTS filter, paired with the
/// parameter key each one is stored under.
const HSTS_ENV_PARAMS: [(&str, &str); 4] = [
    ("HSTS_ENABLE", hsts::ENABLE_PARAM),
    ("HSTS_OVERWRITE", hsts::OVERWRITE_PARAM),
    ("HSTS_MAX_AGE", hsts::MAX_AGE_PARAM),
    ("HSTS_INCLUDE_SUBDOMAINS", hsts::INCLUDE_SUBDOMAINS_PARAM),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    // Raw init parameters for the HSTS filter (only the keys that were set)
    pub hsts_params: FilterParams,
    pub http_limits: HttpLimits,
}

impl Config {
    /// Expects `.env` to have been loaded already (see `app::run`).
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let app_env = AppEnv::from_env();
        let hsts_params = hsts_params_from(|name| std::env::var(name).ok());
        let http_limits = http_limits_from(|name| std::env::var(name).ok());

        Self {
            addr,
            app_env,
            hsts_params,
            http_limits,
        }
    }
}

/// Collect the HSTS filter parameters from a variable lookup.
///
/// Unset variables are left out so the filter applies its own defaults.
fn hsts_params_from<F>(lookup: F) -> FilterParams
where
    F: Fn(&str) -> Option<String>,
{
    HSTS_ENV_PARAMS
        .iter()
        .filter_map(|(var, key)| lookup(var).map(|value| (key.to_string(), value)))
        .collect()
}

fn http_limits_from<F>(lookup: F) -> HttpLimits
where
    F: Fn(&str) -> Option<String>,
{
    let body_limit_bytes = lookup("REQUEST_BODY_LIMIT_BYTES")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(http::BODY_LIMIT_DEFAULT);

    let request_timeout = lookup("REQUEST_TIMEOUT_SECS")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(http::TIMEOUT_DEFAULT);

    HttpLimits {
        body_limit_bytes,
        request_timeout,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn only_set_variables_become_params() {
        let env: HashMap<&str, &str> =
            HashMap::from([("HSTS_ENABLE", "true"), ("HSTS_MAX_AGE", "3600")]);

        let params = hsts_params_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("hsts.enable").map(String::as_str), Some("true"));
        assert_eq!(params.get("hsts.maxAge").map(String::as_str), Some("3600"));
        assert!(!params.contains_key("hsts.overwrite"));
        assert!(!params.contains_key("hsts.includeSubdomains"));
    }

    #[test]
    fn values_are_passed_through_unparsed() {
        let params = hsts_params_from(|name| {
            (name == "HSTS_INCLUDE_SUBDOMAINS").then(|| " FALSE ".to_string())
        });

        assert_eq!(
            params.get("hsts.includeSubdomains").map(String::as_str),
            Some(" FALSE ")
        );
    }

    #[test]
    fn http_limits_default_when_unset_or_invalid() {
        assert_eq!(http_limits_from(|_| None), HttpLimits::default());

        let limits = http_limits_from(|name| match name {
            "REQUEST_BODY_LIMIT_BYTES" => Some("lots".to_string()),
            "REQUEST_TIMEOUT_SECS" => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(limits, HttpLimits::default());
    }

    #[test]
    fn http_limits_from_env_values() {
        let limits = http_limits_from(|name| match name {
            "REQUEST_BODY_LIMIT_BYTES" => Some("2048".to_string()),
            "REQUEST_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        });

        assert_eq!(limits.body_limit_bytes, 2048);
        assert_eq!(limits.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn app_env_accepts_prod_aliases() {
        assert!(AppEnv::parse("production").is_production());
        assert!(AppEnv::parse("PROD").is_production());
        assert!(!AppEnv::parse("staging").is_production());
    }
}
