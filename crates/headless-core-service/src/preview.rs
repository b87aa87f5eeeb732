//! Preview links that open drafts on the frontend instead of the backend theme.

use deunicode::deunicode;
use url::Url;

use crate::config::{FrontendConfig, TypeRegistry};
use crate::models::ContentItem;

const PREVIEW_PATH: &str = "/api/preview";

/// Lowercase ASCII slug: accents are transliterated, alphanumerics and `_`
/// survive, every other run of characters becomes one `-`.
pub fn slugify(title: &str) -> String {
    deunicode(title)
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// The item's own slug, or its slugified title when the slug is empty.
pub fn preview_slug(item: &ContentItem) -> String {
    if item.slug.is_empty() {
        slugify(&item.title)
    } else {
        item.slug.clone()
    }
}

/// The preview link the backend would produce on its own.
pub fn backend_preview_link(item: &ContentItem) -> String {
    match Url::parse(&item.permalink) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("preview", "true");
            url.to_string()
        }
        Err(_) => item.permalink.clone(),
    }
}

/// Preview link for `item`, pointing at the frontend preview route when a
/// frontend is configured.
pub fn resolve_preview_link(
    item: &ContentItem,
    config: &FrontendConfig,
    types: &TypeRegistry,
) -> String {
    let backend_link = backend_preview_link(item);

    let Some(base_url) = &config.base_url else {
        return backend_link;
    };

    let endpoint = format!("{}{PREVIEW_PATH}", base_url.trimmed());
    let Ok(mut url) = Url::parse(&endpoint) else {
        return backend_link;
    };

    url.query_pairs_mut()
        .append_pair("name", &preview_slug(item))
        .append_pair("id", &item.id.to_string())
        .append_pair("post_type", types.external_name(&item.post_type))
        .append_pair(
            "token",
            config.preview_secret_token.as_deref().unwrap_or_default(),
        );

    url.to_string()
}
