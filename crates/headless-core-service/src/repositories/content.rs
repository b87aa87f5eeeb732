use super::traits::ContentRepository;
use crate::errors::ApiError;
use crate::models::{ContentItem, NewContentItem};
use crate::schema::content_items;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteContentRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteContentRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContentRepository for SqliteContentRepository {
    async fn upsert(&self, content: &NewContentItem) -> Result<ContentItem, ApiError> {
        let mut conn = self.db.lock().map_err(|_| ApiError::InternalError)?;
        diesel::replace_into(content_items::table)
            .values(content)
            .execute(&mut *conn)?;
        let result = content_items::table
            .find(content.id)
            .select(ContentItem::as_select())
            .first(&mut *conn)?;
        Ok(result)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<ContentItem>, ApiError> {
        let mut conn = self.db.lock().map_err(|_| ApiError::InternalError)?;
        let result = content_items::table
            .find(id)
            .select(ContentItem::as_select())
            .first(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn update_body(&self, id: i32, content_body: &str) -> Result<ContentItem, ApiError> {
        let mut conn = self.db.lock().map_err(|_| ApiError::InternalError)?;
        let result = diesel::update(content_items::table.find(id))
            .set((
                content_items::content_body.eq(content_body),
                content_items::updated_at.eq(diesel::dsl::now),
            ))
            .returning(ContentItem::as_returning())
            .get_result(&mut *conn)?;
        Ok(result)
    }
}
