//! Dispatches content events to the link migrator and the revalidation notifier.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::{FrontendConfig, SiteUrls};
use crate::errors::ApiError;
use crate::migrate::migrate_links;
use crate::repositories::ContentRepository;
use crate::revalidate::{RevalidationOutcome, Revalidator};

/// Most webhook calls one dispatch can make: the caller's edit plus the edit
/// produced by a link migration write.
pub const MAX_REVALIDATIONS_PER_DISPATCH: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContentEvent {
    /// The item was saved, including its body.
    Saved { id: i32 },
    /// Anything about the item changed: status, meta, terms, comments.
    Edited { id: i32 },
}

/// Per-event flags carried through follow-up events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchContext {
    pub suppress_link_migration: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub links_migrated: bool,
    pub revalidations: Vec<RevalidationOutcome>,
}

#[derive(Clone)]
pub struct EventPipeline<R> {
    repo: R,
    site: SiteUrls,
    revalidator: Revalidator,
}

impl<R: ContentRepository> EventPipeline<R> {
    pub fn new(repo: R, site: SiteUrls, revalidator: Revalidator) -> Self {
        Self {
            repo,
            site,
            revalidator,
        }
    }

    /// Handle `event` and every event its side effects produce.
    pub async fn dispatch(
        &self,
        event: ContentEvent,
        config: &FrontendConfig,
    ) -> Result<DispatchReport, ApiError> {
        self.dispatch_all(&[event], config).await
    }

    /// Handle `events` in order, followed by the events their writes produce.
    #[instrument(skip(self, config))]
    pub async fn dispatch_all(
        &self,
        events: &[ContentEvent],
        config: &FrontendConfig,
    ) -> Result<DispatchReport, ApiError> {
        let mut report = DispatchReport::default();
        let mut queue: VecDeque<_> = events
            .iter()
            .map(|event| (*event, DispatchContext::default()))
            .collect();

        while let Some((event, ctx)) = queue.pop_front() {
            match event {
                ContentEvent::Saved { id } => {
                    if ctx.suppress_link_migration {
                        debug!(id, "Link migration suppressed for own write");
                        continue;
                    }
                    if self.migrate(id, config).await? {
                        report.links_migrated = true;
                        let ctx = DispatchContext {
                            suppress_link_migration: true,
                        };
                        queue.push_back((ContentEvent::Edited { id }, ctx));
                        queue.push_back((ContentEvent::Saved { id }, ctx));
                    }
                }
                ContentEvent::Edited { id } => {
                    let permalink = self
                        .repo
                        .find_by_id(id)
                        .await?
                        .map(|item| item.permalink)
                        .unwrap_or_default();
                    let outcome = self
                        .revalidator
                        .revalidate(id, &permalink, config, &self.site)
                        .await;
                    report.revalidations.push(outcome);
                }
            }
        }

        Ok(report)
    }

    /// Rewrite and persist the item's body. Returns whether a write happened.
    async fn migrate(&self, id: i32, config: &FrontendConfig) -> Result<bool, ApiError> {
        let Some(item) = self.repo.find_by_id(id).await? else {
            debug!(id, "Saved content item not found, skipping link migration");
            return Ok(false);
        };

        let Some(body) = migrate_links(&item.content_body, config, &self.site) else {
            return Ok(false);
        };

        self.repo.update_body(id, &body).await?;
        info!(id, "Rewrote backend links in content body");
        Ok(true)
    }
}
