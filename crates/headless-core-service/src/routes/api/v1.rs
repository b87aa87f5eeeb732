use axum::{
    Router,
    extract::{Json, Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::avatar::{DEFAULT_AVATAR_SIZE, gravatar_url};
use crate::config::FrontendConfig;
use crate::errors::ApiError;
use crate::models::{self, ContentView, HeadlessSettings};
use crate::permalink::content_view;
use crate::pipeline::{ContentEvent, DispatchReport};
use crate::preview::resolve_preview_link;
use crate::rewrite::frontend_home_url;
use crate::validation::sanitize_content_id;
use crate::{
    AppState,
    repositories::{ContentRepository, SettingsRepository},
};

#[derive(Debug, Deserialize)]
struct UpsertContentRequest {
    id: i64,
    post_type: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    title: String,
    status: String,
    #[serde(default)]
    content_body: String,
    permalink: String,
}

#[derive(Debug, Serialize)]
struct UpsertContentResponse {
    item: ContentView,
    dispatch: DispatchReport,
}

#[derive(Debug, Serialize)]
struct LinkResponse {
    link: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdditionalSettings {
    error404_page: Option<ContentView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HeadlessConfigResponse {
    additional_settings: AdditionalSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HomepageSettingsResponse {
    front_page: Option<ContentView>,
    posts_page: Option<ContentView>,
}

#[derive(Debug, Deserialize)]
struct AvatarQuery {
    email: Option<String>,
    size: Option<u32>,
}

#[derive(Debug, Serialize)]
struct AvatarResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct HomeUrlQuery {
    #[serde(default)]
    path: String,
    scheme: Option<String>,
    #[serde(default)]
    admin: bool,
}

#[derive(Debug, Serialize)]
struct HomeUrlResponse {
    url: String,
}

async fn health() -> &'static str {
    "OK"
}

/// Build this request's frontend configuration from the stored settings.
async fn frontend_config<S: AppState>(state: &S) -> Result<FrontendConfig, ApiError> {
    let stored = state.settings_repo().load().await?;
    Ok(state.headless().frontend_config(&stored))
}

async fn find_view<S: AppState>(
    state: &S,
    id: i32,
    config: &FrontendConfig,
) -> Result<Option<ContentView>, ApiError> {
    let headless = state.headless();
    let item = state.content_repo().find_by_id(id).await?;
    Ok(item.map(|item| content_view(item, config, &headless.site, &headless.types)))
}

/// Look up an optional page id from the settings, ignoring unset or zero ids.
async fn find_page<S: AppState>(
    state: &S,
    id: Option<i32>,
    config: &FrontendConfig,
) -> Result<Option<ContentView>, ApiError> {
    match id.filter(|id| *id > 0) {
        Some(id) => find_view(state, id, config).await,
        None => Ok(None),
    }
}

#[instrument(skip_all, fields(id = payload.id, status = %payload.status, body_length = payload.content_body.len()))]
async fn upsert_content<S: AppState>(
    State(state): State<S>,
    Json(payload): Json<UpsertContentRequest>,
) -> Result<ResponseJson<UpsertContentResponse>, ApiError> {
    debug!("Processing content upsert");

    let new_content = models::NewContentItem::new(
        payload.id,
        payload.post_type,
        payload.slug,
        payload.title,
        payload.status,
        payload.content_body,
        payload.permalink,
    )?;
    let id = new_content.id;

    state.content_repo().upsert(&new_content).await?;

    let config = frontend_config(&state).await?;
    let dispatch = state
        .pipeline()
        .dispatch_all(
            &[ContentEvent::Edited { id }, ContentEvent::Saved { id }],
            &config,
        )
        .await?;

    let item = find_view(&state, id, &config)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!(
        id,
        links_migrated = dispatch.links_migrated,
        "Stored content item"
    );

    Ok(ResponseJson(UpsertContentResponse { item, dispatch }))
}

#[instrument(skip_all, fields(id = %id))]
async fn get_content_by_id<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<ResponseJson<ContentView>, ApiError> {
    debug!("Processing get content by ID request");

    let config = frontend_config(&state).await?;
    match find_view(&state, id, &config).await? {
        Some(view) => Ok(ResponseJson(view)),
        None => {
            debug!("Content item not found");
            Err(ApiError::NotFound)
        }
    }
}

#[instrument(skip_all, fields(id = %id))]
async fn get_preview_link<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<ResponseJson<LinkResponse>, ApiError> {
    let item = state
        .content_repo()
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let config = frontend_config(&state).await?;
    let link = resolve_preview_link(&item, &config, &state.headless().types);

    Ok(ResponseJson(LinkResponse { link }))
}

#[instrument(skip_all, fields(event = ?event))]
async fn dispatch_event<S: AppState>(
    State(state): State<S>,
    Json(event): Json<ContentEvent>,
) -> Result<ResponseJson<DispatchReport>, ApiError> {
    let config = frontend_config(&state).await?;
    let report = state.pipeline().dispatch(event, &config).await?;
    Ok(ResponseJson(report))
}

async fn get_settings<S: AppState>(
    State(state): State<S>,
) -> Result<ResponseJson<HeadlessSettings>, ApiError> {
    Ok(ResponseJson(state.settings_repo().load().await?))
}

/// Replace the stored settings. Ids that are not non-negative integers are dropped.
#[instrument(skip_all)]
async fn put_settings<S: AppState>(
    State(state): State<S>,
    Json(input): Json<Map<String, Value>>,
) -> Result<ResponseJson<HeadlessSettings>, ApiError> {
    let mut settings = HeadlessSettings::default();

    for (key, value) in &input {
        let id = sanitize_content_id(value);
        match key.as_str() {
            "error_404_page" => settings.error_404_page = id,
            "page_on_front" => settings.page_on_front = id,
            "page_for_posts" => settings.page_for_posts = id,
            other => debug!(key = other, "Ignoring unknown setting"),
        }
    }

    let saved = state.settings_repo().save(&settings).await?;
    info!(settings = ?saved, "Saved headless settings");
    Ok(ResponseJson(saved))
}

async fn get_headless_config<S: AppState>(
    State(state): State<S>,
) -> Result<ResponseJson<HeadlessConfigResponse>, ApiError> {
    let stored = state.settings_repo().load().await?;
    let config = state.headless().frontend_config(&stored);

    let error404_page = find_page(&state, stored.error_404_page, &config).await?;

    Ok(ResponseJson(HeadlessConfigResponse {
        additional_settings: AdditionalSettings { error404_page },
    }))
}

async fn get_homepage_settings<S: AppState>(
    State(state): State<S>,
) -> Result<ResponseJson<HomepageSettingsResponse>, ApiError> {
    let stored = state.settings_repo().load().await?;
    let config = state.headless().frontend_config(&stored);

    Ok(ResponseJson(HomepageSettingsResponse {
        front_page: find_page(&state, stored.page_on_front, &config).await?,
        posts_page: find_page(&state, stored.page_for_posts, &config).await?,
    }))
}

async fn get_avatar(
    Query(query): Query<AvatarQuery>,
) -> Result<ResponseJson<AvatarResponse>, ApiError> {
    let size = query.size.unwrap_or(DEFAULT_AVATAR_SIZE);
    if size == 0 {
        return Err(ApiError::BadRequest(
            "Size must be greater than 0".to_string(),
        ));
    }

    Ok(ResponseJson(AvatarResponse {
        url: gravatar_url(query.email.as_deref(), size),
    }))
}

async fn get_home_url<S: AppState>(
    State(state): State<S>,
    Query(query): Query<HomeUrlQuery>,
) -> ResponseJson<HomeUrlResponse> {
    let headless = state.headless();
    let backend_url = format!(
        "{}/{}",
        headless.site.home_url.trimmed(),
        query.path.trim_start_matches('/')
    );

    let url = frontend_home_url(
        &backend_url,
        &query.path,
        query.scheme.as_deref(),
        query.admin,
        headless.frontend.base_url.as_ref().map(|base| base.as_str()),
    );

    ResponseJson(HomeUrlResponse { url })
}

pub fn create_api_v1_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/health", get(health))
        .route("/content", post(upsert_content::<S>))
        .route("/content/{id}", get(get_content_by_id::<S>))
        .route("/content/{id}/preview", get(get_preview_link::<S>))
        .route("/events", post(dispatch_event::<S>))
        .route("/settings", get(get_settings::<S>).put(put_settings::<S>))
        .route("/headless-config", get(get_headless_config::<S>))
        .route("/homepage-settings", get(get_homepage_settings::<S>))
        .route("/avatar", get(get_avatar))
        .route("/links/home", get(get_home_url::<S>))
}
