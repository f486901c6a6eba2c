//! Runtime configuration read from the environment.

use thiserror::Error;
use url::Url;

use crate::modal::{DEFAULT_REFERRER_URL, DEFAULT_WIDGET_PAGE_URL, DEFAULT_WIDGET_URL, WidgetConfig};

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const DEFAULT_SITE_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: invalid url '{value}': {source}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        source: url::ParseError,
    },

    #[error("{var}: expected a boolean, got '{value}'")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Enables client-side payment retrieval when set
    pub publishable_key: Option<String>,
    pub stripe_api_base: Url,
    /// Base of the status-lookup and form submission endpoints
    pub site_base_url: Url,
    pub widget: WidgetConfig,
}

impl Config {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to read variables. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let parse_url = |var: &'static str, default: &str| -> Result<Url, ConfigError> {
            let value = get(var).unwrap_or_else(|| default.to_owned());
            Url::parse(&value).map_err(|source| ConfigError::InvalidUrl { var, value, source })
        };

        let flag = |var: &'static str| -> Result<bool, ConfigError> {
            match get(var) {
                None => Ok(false),
                Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => Ok(true),
                    "0" | "false" | "no" | "off" => Ok(false),
                    _ => Err(ConfigError::InvalidBool { var, value }),
                },
            }
        };

        Ok(Self {
            publishable_key: get("STRIPE_PUBLISHABLE_KEY"),
            stripe_api_base: parse_url("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE)?,
            site_base_url: parse_url("SITE_BASE_URL", DEFAULT_SITE_BASE_URL)?,
            widget: WidgetConfig {
                base_url: parse_url("DONATION_WIDGET_URL", DEFAULT_WIDGET_URL)?,
                widget_page_url: parse_url("DONATION_WIDGET_PAGE_URL", DEFAULT_WIDGET_PAGE_URL)?,
                referrer_url: parse_url("DONATION_REFERRER_URL", DEFAULT_REFERRER_URL)?,
                recurring_follows_frequency: flag("DONATION_RECURRING_FOLLOWS_FREQUENCY")?,
            },
        })
    }
}

/// Append path segments to `base`, ignoring a trailing slash on it.
/// Returns `None` when `base` cannot carry a path.
pub(crate) fn append_segments(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
    Some(url)
}
