mod content;
mod settings;
mod traits;

pub use content::SqliteContentRepository;
pub use settings::SqliteSettingsRepository;
pub use traits::{ContentRepository, SettingsRepository};
