//! Rewrites backend links saved inside content bodies so they point at the
//! frontend. Media uploads and plugin assets keep resolving against the backend.

use crate::config::{FrontendConfig, SiteUrls};
use crate::rewrite::{contains_ignore_case, replace_ignore_case};

/// The migrated body, or `None` when nothing needs to be written back.
pub fn migrate_links(body: &str, config: &FrontendConfig, site: &SiteUrls) -> Option<String> {
    let base_url = config.base_url.as_ref()?;
    let backend = site.site_url.trimmed();

    if !contains_ignore_case(body, backend) {
        return None;
    }

    let frontend = base_url.trimmed();
    let mut migrated = replace_ignore_case(body, backend, frontend);

    // Assets must be reverted after the general pass.
    for asset_path in [site.upload_path(), site.plugin_path()] {
        if asset_path.is_empty() {
            continue;
        }
        migrated = replace_ignore_case(
            &migrated,
            &format!("{frontend}{asset_path}"),
            &format!("{backend}{asset_path}"),
        );
    }

    (migrated != body).then_some(migrated)
}
