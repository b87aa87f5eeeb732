//! On-demand revalidation: tells the frontend that its cached rendering of a
//! path is stale.
//!
//! Failures are logged and reported as an outcome. They never abort the
//! content change that triggered them.

use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{FrontendConfig, SiteUrls};
use crate::rewrite::{replace_ignore_case, to_frontend};

const REVALIDATE_PATH: &str = "/api/wordpress/revalidate";

/// Wire payload for the frontend revalidation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevalidationRequest {
    pub secret: String,
    pub slug: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingConfiguration,
    MissingContentId,
    MissingSlug,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevalidationOutcome {
    Revalidated { slug: String },
    Skipped { reason: SkipReason },
    Failed { slug: String, status: Option<u16> },
}

/// Frontend-relative slug for a backend permalink, without a leading slash.
pub fn revalidation_slug(permalink: &str, frontend_base: &str, site: &SiteUrls) -> String {
    let frontend = crate::rewrite::trim_trailing_slash(frontend_base);
    let on_frontend = to_frontend(permalink, site.site_url.trimmed(), frontend);
    replace_ignore_case(&on_frontend, frontend, "")
        .trim_start_matches('/')
        .to_string()
}

#[derive(Debug, Clone)]
pub struct Revalidator {
    client: reqwest::Client,
    timeout: Duration,
}

impl Revalidator {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Upper bound on how long one webhook call may take.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the request for content `id`, or the reason it cannot be sent.
    pub fn prepare(
        id: i32,
        permalink: &str,
        config: &FrontendConfig,
        site: &SiteUrls,
    ) -> Result<(String, RevalidationRequest), SkipReason> {
        let (Some(base_url), Some(secret)) = (&config.base_url, &config.preview_secret_token)
        else {
            warn!("Missing frontend URL or preview secret for on demand revalidation");
            return Err(SkipReason::MissingConfiguration);
        };

        if id <= 0 {
            warn!(id, "Missing content id for on demand revalidation");
            return Err(SkipReason::MissingContentId);
        }

        let slug = revalidation_slug(permalink, base_url.as_str(), site);
        if slug.is_empty() {
            warn!(id, permalink, "Missing content slug for on demand revalidation");
            return Err(SkipReason::MissingSlug);
        }

        let endpoint = format!("{}{REVALIDATE_PATH}", base_url.trimmed());
        let request = RevalidationRequest {
            secret: secret.clone(),
            slug: format!("/{slug}"),
        };
        Ok((endpoint, request))
    }

    pub async fn revalidate(
        &self,
        id: i32,
        permalink: &str,
        config: &FrontendConfig,
        site: &SiteUrls,
    ) -> RevalidationOutcome {
        let (endpoint, request) = match Self::prepare(id, permalink, config, site) {
            Ok(prepared) => prepared,
            Err(reason) => return RevalidationOutcome::Skipped { reason },
        };
        let slug = request.slug.trim_start_matches('/').to_string();

        let result = self.client.post(&endpoint).json(&request).send().await;

        match result {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                info!(id, slug = %slug, "Revalidated frontend cache");
                RevalidationOutcome::Revalidated { slug }
            }
            Ok(response) => {
                let status = response.status().as_u16();
                error!(id, status, "Failed to revalidate cache for post {slug}.");
                RevalidationOutcome::Failed {
                    slug,
                    status: Some(status),
                }
            }
            Err(err) => {
                error!(id, error = %err, "Failed to revalidate cache for post {slug}.");
                RevalidationOutcome::Failed { slug, status: None }
            }
        }
    }
}
