//! Service configuration.
//!
//! Deployment-level values come from environment variables once at startup.
//! The per-request [`FrontendConfig`] combines them with the stored settings
//! and is passed explicitly to every component.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::models::HeadlessSettings;
use crate::rewrite::{replace_ignore_case, trim_trailing_slash};
use crate::validation::{BaseUrl, ValidationError, validate_base_url};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_REVALIDATE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TYPE_NAMES: &str = "post=Post,page=Page";
const UPLOADS_SUFFIX: &str = "/wp-content/uploads";
const PLUGINS_SUFFIX: &str = "/wp-content/plugins";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),
    #[error("{var} is not a valid base URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("{var} must be a positive number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Frontend settings that do not change while the service runs.
#[derive(Debug, Clone, Default)]
pub struct FrontendSettings {
    pub base_url: Option<BaseUrl>,
    pub preview_secret_token: Option<String>,
}

impl FrontendSettings {
    /// Build the immutable per-request view.
    pub fn with_stored(&self, stored: &HeadlessSettings) -> FrontendConfig {
        FrontendConfig {
            base_url: self.base_url.clone(),
            preview_secret_token: self.preview_secret_token.clone(),
            error_404_content_id: stored.error_404_page.filter(|id| *id > 0),
        }
    }
}

/// Everything a component needs to know about the frontend for one request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrontendConfig {
    pub base_url: Option<BaseUrl>,
    #[serde(skip_serializing)]
    pub preview_secret_token: Option<String>,
    pub error_404_content_id: Option<i32>,
}

/// Backend locations used to decide what gets rewritten.
#[derive(Debug, Clone)]
pub struct SiteUrls {
    pub site_url: BaseUrl,
    pub home_url: BaseUrl,
    pub uploads_url: String,
    pub plugins_url: String,
}

impl SiteUrls {
    /// Site and home share one URL, assets live under `wp-content`.
    pub fn new(site_url: BaseUrl) -> Self {
        let uploads_url = format!("{}{UPLOADS_SUFFIX}", site_url.trimmed());
        let plugins_url = format!("{}{PLUGINS_SUFFIX}", site_url.trimmed());
        Self {
            home_url: site_url.clone(),
            site_url,
            uploads_url,
            plugins_url,
        }
    }

    /// The uploads base with the backend domain stripped, e.g. `/wp-content/uploads`.
    pub fn upload_path(&self) -> String {
        self.backend_relative(&self.uploads_url)
    }

    pub fn plugin_path(&self) -> String {
        self.backend_relative(&self.plugins_url)
    }

    fn backend_relative(&self, url: &str) -> String {
        replace_ignore_case(url, self.site_url.trimmed(), "")
    }
}

/// Maps internal content type names to the names the frontend schema uses.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    names: HashMap<String, String>,
}

impl TypeRegistry {
    /// Parse `internal=External` pairs separated by commas. Malformed pairs are skipped.
    pub fn parse(pairs: &str) -> Self {
        let names = pairs
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(internal, external)| (internal.trim(), external.trim()))
            .filter(|(internal, external)| !internal.is_empty() && !external.is_empty())
            .map(|(internal, external)| (internal.to_string(), external.to_string()))
            .collect();
        Self { names }
    }

    /// The registered external name, or the internal name when none is registered.
    pub fn external_name<'a>(&'a self, internal: &'a str) -> &'a str {
        self.names.get(internal).map(String::as_str).unwrap_or(internal)
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub database_url: String,
    pub frontend: FrontendSettings,
    pub site: SiteUrls,
    pub types: TypeRegistry,
    pub revalidate_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let bind_address = get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.into());

        let site_url = get("BACKEND_SITE_URL").ok_or(ConfigError::Missing("BACKEND_SITE_URL"))?;
        let site_url = parse_url("BACKEND_SITE_URL", &site_url)?;
        let mut site = SiteUrls::new(site_url);
        if let Some(home) = get("BACKEND_HOME_URL") {
            site.home_url = parse_url("BACKEND_HOME_URL", &home)?;
        }
        if let Some(uploads) = get("BACKEND_UPLOADS_URL") {
            site.uploads_url = trim_trailing_slash(&uploads).to_string();
        }
        if let Some(plugins) = get("BACKEND_PLUGINS_URL") {
            site.plugins_url = trim_trailing_slash(&plugins).to_string();
        }

        let frontend = FrontendSettings {
            base_url: get("HEADLESS_FRONTEND_URL")
                .map(|url| parse_url("HEADLESS_FRONTEND_URL", &url))
                .transpose()?,
            preview_secret_token: get("PREVIEW_SECRET_TOKEN"),
        };

        let types =
            TypeRegistry::parse(&get("HEADLESS_TYPE_NAMES").unwrap_or_else(|| DEFAULT_TYPE_NAMES.into()));

        let revalidate_timeout = match get("REVALIDATE_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: "REVALIDATE_TIMEOUT_SECS",
                        value,
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_REVALIDATE_TIMEOUT_SECS),
        };

        Ok(Self {
            bind_address,
            database_url,
            frontend,
            site,
            types,
            revalidate_timeout,
        })
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<BaseUrl, ConfigError> {
    validate_base_url(value).map_err(|source| ConfigError::InvalidUrl { var, source })
}
