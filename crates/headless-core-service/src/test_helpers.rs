use crate::db::establish_connection;
use diesel::sqlite::SqliteConnection;

pub fn establish_test_connection() -> SqliteConnection {
    establish_connection(":memory:").expect("Failed to create in-memory database")
}

pub mod fixtures {
    use crate::config::{FrontendConfig, FrontendSettings, SiteUrls, TypeRegistry};
    use crate::models::ContentItem;
    use crate::validation::validate_base_url;

    pub const BACKEND: &str = "https://cms.example";
    pub const FRONTEND: &str = "https://app.example/";
    pub const SECRET: &str = "s3cret";

    pub fn site() -> SiteUrls {
        SiteUrls::new(validate_base_url(BACKEND).expect("valid backend URL"))
    }

    pub fn types() -> TypeRegistry {
        TypeRegistry::parse("post=Post,page=Page")
    }

    pub fn frontend_settings() -> FrontendSettings {
        FrontendSettings {
            base_url: Some(validate_base_url(FRONTEND).expect("valid frontend URL")),
            preview_secret_token: Some(SECRET.to_string()),
        }
    }

    pub fn frontend_config() -> FrontendConfig {
        frontend_settings().with_stored(&Default::default())
    }

    pub fn item(id: i32, status: &str, permalink: &str) -> ContentItem {
        ContentItem {
            id,
            post_type: "post".to_string(),
            slug: format!("post-{id}"),
            title: format!("Post {id}"),
            status: status.to_string(),
            content_body: String::new(),
            permalink: permalink.to_string(),
            updated_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .expect("valid timestamp"),
        }
    }
}
