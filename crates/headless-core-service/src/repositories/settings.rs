use super::traits::SettingsRepository;
use crate::errors::ApiError;
use crate::models::{HeadlessSettings, SettingsRow};
use crate::schema::headless_settings;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteSettingsRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteSettingsRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn load(&self) -> Result<HeadlessSettings, ApiError> {
        let mut conn = self.db.lock().map_err(|_| ApiError::InternalError)?;
        let row = headless_settings::table
            .find(SettingsRow::ID)
            .select(SettingsRow::as_select())
            .first(&mut *conn)
            .optional()?;
        Ok(row.map(HeadlessSettings::from).unwrap_or_default())
    }

    async fn save(&self, settings: &HeadlessSettings) -> Result<HeadlessSettings, ApiError> {
        let mut conn = self.db.lock().map_err(|_| ApiError::InternalError)?;
        diesel::replace_into(headless_settings::table)
            .values(SettingsRow::from(settings))
            .execute(&mut *conn)?;
        Ok(settings.clone())
    }
}
