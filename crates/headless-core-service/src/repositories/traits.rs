use crate::errors::ApiError;
use crate::models::{ContentItem, HeadlessSettings, NewContentItem};
use async_trait::async_trait;

#[async_trait]
pub trait ContentRepository: Clone + Send + Sync + 'static {
    /// Insert the item or replace the stored copy with the same id.
    async fn upsert(&self, content: &NewContentItem) -> Result<ContentItem, ApiError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<ContentItem>, ApiError>;
    async fn update_body(&self, id: i32, content_body: &str) -> Result<ContentItem, ApiError>;
}

#[async_trait]
pub trait SettingsRepository: Clone + Send + Sync + 'static {
    /// Stored settings, or all-empty settings when nothing was saved yet.
    async fn load(&self) -> Result<HeadlessSettings, ApiError>;
    async fn save(&self, settings: &HeadlessSettings) -> Result<HeadlessSettings, ApiError>;
}
