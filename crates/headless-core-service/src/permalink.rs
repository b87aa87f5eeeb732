//! Links reported for content items in serialized API responses.

use crate::config::{FrontendConfig, SiteUrls, TypeRegistry};
use crate::models::{ContentItem, ContentStatus, ContentView};
use crate::preview::resolve_preview_link;
use crate::rewrite::{contains_ignore_case, to_frontend};

/// The external link for `item`.
///
/// Drafts link to their frontend preview, published items to their frontend
/// permalink (or the frontend 404 route for the designated error page). Every
/// other status keeps the backend permalink.
pub fn resolve_link(
    item: &ContentItem,
    config: &FrontendConfig,
    site: &SiteUrls,
    types: &TypeRegistry,
) -> String {
    match item.status() {
        ContentStatus::Draft => resolve_preview_link(item, config, types),
        ContentStatus::Publish => published_link(item, config, site),
        ContentStatus::Other(_) => item.permalink.clone(),
    }
}

fn published_link(item: &ContentItem, config: &FrontendConfig, site: &SiteUrls) -> String {
    let Some(base_url) = &config.base_url else {
        return item.permalink.clone();
    };
    let frontend = base_url.trimmed();

    if config.error_404_content_id == Some(item.id) {
        return format!("{frontend}/404");
    }

    let backend = site.site_url.trimmed();
    if contains_ignore_case(&item.permalink, backend) {
        to_frontend(&item.permalink, backend, frontend)
    } else {
        item.permalink.clone()
    }
}

/// Serialize `item` with its link overridden.
pub fn content_view(
    item: ContentItem,
    config: &FrontendConfig,
    site: &SiteUrls,
    types: &TypeRegistry,
) -> ContentView {
    let link = resolve_link(&item, config, site, types);
    ContentView {
        id: item.id,
        post_type: item.post_type,
        slug: item.slug,
        title: item.title,
        status: item.status,
        content_body: item.content_body,
        link,
        updated_at: item.updated_at,
    }
}
