use crate::validation::{ValidationError, validate_content_id};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A content item mirrored from the CMS.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::content_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ContentItem {
    pub id: i32,
    pub post_type: String,
    pub slug: String,
    pub title: String,
    pub status: String,
    pub content_body: String,
    pub permalink: String,
    pub updated_at: chrono::NaiveDateTime,
}

impl ContentItem {
    pub fn status(&self) -> ContentStatus {
        ContentStatus::from(self.status.as_str())
    }
}

#[derive(Debug, Clone, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::content_items)]
pub struct NewContentItem {
    pub id: i32,
    pub post_type: String,
    pub slug: String,
    pub title: String,
    pub status: String,
    pub content_body: String,
    pub permalink: String,
}

impl NewContentItem {
    pub fn new(
        id: i64,
        post_type: String,
        slug: String,
        title: String,
        status: String,
        content_body: String,
        permalink: String,
    ) -> Result<Self, ValidationError> {
        let id = validate_content_id(id)?;

        Ok(NewContentItem {
            id,
            post_type,
            slug: slug.trim().to_string(),
            title,
            status: status.trim().to_lowercase(),
            content_body,
            permalink,
        })
    }
}

/// Publication status. Only drafts and published items get special link handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentStatus {
    Draft,
    Publish,
    Other(String),
}

impl From<&str> for ContentStatus {
    fn from(status: &str) -> Self {
        match status {
            "draft" => ContentStatus::Draft,
            "publish" => ContentStatus::Publish,
            other => ContentStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentStatus::Draft => write!(f, "draft"),
            ContentStatus::Publish => write!(f, "publish"),
            ContentStatus::Other(status) => write!(f, "{status}"),
        }
    }
}

/// A content item as serialized to API consumers, with `link` pointing wherever
/// the frontend wants readers to go.
#[derive(Debug, Clone, Serialize)]
pub struct ContentView {
    pub id: i32,
    pub post_type: String,
    pub slug: String,
    pub title: String,
    pub status: String,
    pub content_body: String,
    pub link: String,
    pub updated_at: chrono::NaiveDateTime,
}

/// Headless options editable by administrators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlessSettings {
    pub error_404_page: Option<i32>,
    pub page_on_front: Option<i32>,
    pub page_for_posts: Option<i32>,
}

/// The single persisted settings row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::headless_settings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SettingsRow {
    pub id: i32,
    pub error_404_page: Option<i32>,
    pub page_on_front: Option<i32>,
    pub page_for_posts: Option<i32>,
}

impl SettingsRow {
    pub const ID: i32 = 1;
}

impl From<SettingsRow> for HeadlessSettings {
    fn from(row: SettingsRow) -> Self {
        HeadlessSettings {
            error_404_page: row.error_404_page,
            page_on_front: row.page_on_front,
            page_for_posts: row.page_for_posts,
        }
    }
}

impl From<&HeadlessSettings> for SettingsRow {
    fn from(settings: &HeadlessSettings) -> Self {
        SettingsRow {
            id: SettingsRow::ID,
            error_404_page: settings.error_404_page,
            page_on_front: settings.page_on_front,
            page_for_posts: settings.page_for_posts,
        }
    }
}
