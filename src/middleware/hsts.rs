//! HTTP Strict Transport Security (HSTS) response header.
//!
//! Responsibility:
//! - Turn the filter's init parameters into an immutable [`HstsConfig`]
//! - Set `Strict-Transport-Security` on every outgoing response
//!
//! Filter parameters:
//!
//! | Key                      | Values      | Default |
//! |--------------------------|-------------|---------|
//! | `hsts.enable`            | true, false | false   |
//! | `hsts.overwrite`         | true, false | false   |
//! | `hsts.maxAge`            | 0..=u32::MAX seconds | 86400 |
//! | `hsts.includeSubdomains` | true, false | true    |
//!
//! A value that cannot be parsed never stops the server: the default is used
//! and a warning is logged.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header::STRICT_TRANSPORT_SECURITY},
    middleware::{self, Next},
    response::Response,
};

/// Init parameters handed to the filter (key -> raw value).
pub type FilterParams = BTreeMap<String, String>;

pub const ENABLE_PARAM: &str = "hsts.enable";
pub const OVERWRITE_PARAM: &str = "hsts.overwrite";
pub const MAX_AGE_PARAM: &str = "hsts.maxAge";
pub const INCLUDE_SUBDOMAINS_PARAM: &str = "hsts.includeSubdomains";

pub const ENABLE_DEFAULT: bool = false;
pub const OVERWRITE_DEFAULT: bool = false;
/// One day.
pub const MAX_AGE_DEFAULT: u32 = 86_400;
pub const INCLUDE_SUBDOMAINS_DEFAULT: bool = true;

const INCLUDE_SUBDOMAINS_DIRECTIVE: &str = "; includeSubDomains";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HstsConfig {
    pub enabled: bool,
    pub overwrite: bool,
    pub max_age_seconds: u32,
    pub include_subdomains: bool,
}

impl Default for HstsConfig {
    fn default() -> Self {
        Self {
            enabled: ENABLE_DEFAULT,
            overwrite: OVERWRITE_DEFAULT,
            max_age_seconds: MAX_AGE_DEFAULT,
            include_subdomains: INCLUDE_SUBDOMAINS_DEFAULT,
        }
    }
}

impl HstsConfig {
    /// Build the config from init parameters. Never fails.
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            enabled: param_or_default(params, ENABLE_PARAM, ENABLE_DEFAULT, parse_bool),
            overwrite: param_or_default(params, OVERWRITE_PARAM, OVERWRITE_DEFAULT, parse_bool),
            max_age_seconds: param_or_default(params, MAX_AGE_PARAM, MAX_AGE_DEFAULT, |v| {
                u32::from_str(v.trim()).ok()
            }),
            include_subdomains: param_or_default(
                params,
                INCLUDE_SUBDOMAINS_PARAM,
                INCLUDE_SUBDOMAINS_DEFAULT,
                parse_bool,
            ),
        }
    }

    /// `max-age=<N>` with `; includeSubDomains` appended when enabled.
    pub fn header_value(&self) -> String {
        let suffix = if self.include_subdomains {
            INCLUDE_SUBDOMAINS_DIRECTIVE
        } else {
            ""
        };
        format!("max-age={}{}", self.max_age_seconds, suffix)
    }

    /// Set the HSTS header on a response's headers according to this config.
    ///
    /// An existing header is only replaced when `overwrite` is set. Replacing
    /// drops every previous value, so applying twice leaves a single header.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        if !self.enabled {
            return;
        }
        if !self.overwrite && headers.contains_key(STRICT_TRANSPORT_SECURITY) {
            return;
        }

        // Only ASCII digits and fixed text, so this is never rejected.
        let Ok(value) = HeaderValue::try_from(self.header_value()) else {
            return;
        };
        headers.insert(STRICT_TRANSPORT_SECURITY, value);
    }
}

fn param_or_default<T, F>(params: &FilterParams, key: &str, default: T, parse: F) -> T
where
    T: Display + Copy,
    F: Fn(&str) -> Option<T>,
{
    let Some(raw) = params.get(key) else {
        return default;
    };

    match parse(raw) {
        Some(value) => value,
        None => {
            tracing::warn!(
                key,
                value = %raw,
                default = %default,
                "unparseable filter parameter, using default"
            );
            default
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Apply the HSTS middleware to the given Router.
///
/// The header is set after the inner service has produced the response, so a
/// value set by a handler counts as pre-existing.
pub fn apply<S>(router: Router<S>, config: HstsConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(config, hsts_middleware))
}

async fn hsts_middleware(
    State(config): State<HstsConfig>,
    req: Request,
    next: Next,
) -> Response {
    let mut res = next.run(req).await;
    config.apply_to(res.headers_mut());
    res
}
