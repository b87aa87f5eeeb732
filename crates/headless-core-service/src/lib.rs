use axum::Router;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub mod avatar;
pub mod config;
pub mod db;
pub mod errors;
pub mod gate;
pub mod migrate;
pub mod models;
pub mod permalink;
pub mod pipeline;
pub mod preview;
pub mod repositories;
pub mod revalidate;
pub mod rewrite;
pub mod routes;
pub mod schema;
pub mod validation;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use config::{FrontendConfig, FrontendSettings, ServiceConfig, SiteUrls, TypeRegistry};
use gate::{GateConfig, PublicAccessGateLayer};
use models::HeadlessSettings;
use pipeline::{EventPipeline, MAX_REVALIDATIONS_PER_DISPATCH};
use repositories::{
    ContentRepository, SettingsRepository, SqliteContentRepository, SqliteSettingsRepository,
};
use revalidate::Revalidator;

/// Time left for storage and routing on top of the revalidation budget.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Deployment-wide headless configuration shared by every request.
#[derive(Debug, Clone)]
pub struct Headless {
    pub frontend: FrontendSettings,
    pub site: SiteUrls,
    pub types: TypeRegistry,
    pub revalidator: Revalidator,
}

impl Headless {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            frontend: config.frontend.clone(),
            site: config.site.clone(),
            types: config.types.clone(),
            revalidator: Revalidator::new(config.revalidate_timeout)?,
        })
    }

    pub fn frontend_config(&self, stored: &HeadlessSettings) -> FrontendConfig {
        self.frontend.with_stored(stored)
    }

    /// How long a request may run. Always outlasts every webhook call a
    /// single dispatch can make, so a stalled frontend cannot fail a save.
    pub fn request_timeout(&self) -> Duration {
        self.revalidator
            .timeout()
            .checked_mul(MAX_REVALIDATIONS_PER_DISPATCH)
            .and_then(|budget| budget.checked_add(REQUEST_TIMEOUT_MARGIN))
            .unwrap_or(Duration::MAX)
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig::new(self.frontend.base_url.clone(), self.site.clone())
    }
}

pub trait AppState: Clone + Send + Sync + 'static {
    type Content: ContentRepository;
    type Settings: SettingsRepository;

    fn content_repo(&self) -> Self::Content;
    fn settings_repo(&self) -> Self::Settings;
    fn headless(&self) -> &Headless;

    fn pipeline(&self) -> EventPipeline<Self::Content> {
        let headless = self.headless();
        EventPipeline::new(
            self.content_repo(),
            headless.site.clone(),
            headless.revalidator.clone(),
        )
    }
}

#[derive(Clone)]
pub struct DefaultAppState {
    db: Arc<Mutex<SqliteConnection>>,
    headless: Arc<Headless>,
}

impl DefaultAppState {
    pub fn new(db: Arc<Mutex<SqliteConnection>>, headless: Headless) -> Self {
        Self {
            db,
            headless: Arc::new(headless),
        }
    }
}

impl AppState for DefaultAppState {
    type Content = SqliteContentRepository;
    type Settings = SqliteSettingsRepository;

    fn content_repo(&self) -> Self::Content {
        SqliteContentRepository::new(self.db.clone())
    }

    fn settings_repo(&self) -> Self::Settings {
        SqliteSettingsRepository::new(self.db.clone())
    }

    fn headless(&self) -> &Headless {
        &self.headless
    }
}

/// The full application: API routes behind the public access gate.
pub fn create_app<S: AppState>(state: S) -> Router {
    let gate = PublicAccessGateLayer::new(state.headless().gate_config());
    routes::create_router().layer(gate).with_state(state)
}

/// The application with the request tracing and timeout layers it is served with.
pub fn create_service<S: AppState>(state: S) -> Router {
    let timeout = state.headless().request_timeout();
    create_app(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(timeout)),
    )
}
