use crate::core::drag::{classify, Classification, DragRef};
use crate::core::reorder::{apply, PersistencePlan, Reordered};
use crate::core::sync::{SyncDispatcher, SyncOutcome, Ticket};
use crate::domain::model::{Category, CategoryId, Collection, NewSite, Site, SiteId};
use crate::domain::ports::{Catalog, OrderStore, SyncMode};
use crate::utils::error::{OrganizerError, Result};
use crate::utils::validation::{validate_site_url, validate_user_text};
use std::sync::Arc;

/// Why a drop did not change anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// 沒有目標，或拖回自己身上
    NoTarget,
    /// 拖曳的項目已被刪除
    StaleReference,
    /// 位置沒有變化
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Applied { ticket: Ticket, plan: PersistencePlan },
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub committed: usize,
    pub failures: Vec<SyncOutcome>,
    pub refetched: bool,
}

/// Owns the local collection and turns drag gestures into optimistic local
/// changes plus queued persistence plans.
pub struct Organizer<B> {
    backend: Arc<B>,
    collection: Collection,
    dispatcher: SyncDispatcher,
}

impl<B> Organizer<B>
where
    B: Catalog + OrderStore + 'static,
{
    /// 建立時不會抓資料，需要呼叫 `refresh`
    pub fn new(backend: Arc<B>, mode: SyncMode) -> Self {
        let store: Arc<dyn OrderStore> = backend.clone();
        Self {
            backend,
            collection: Collection::default(),
            dispatcher: SyncDispatcher::spawn(store, mode),
        }
    }

    pub async fn connect(backend: Arc<B>, mode: SyncMode) -> Result<Self> {
        let mut organizer = Self::new(backend, mode);
        organizer.refresh().await?;
        Ok(organizer)
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn categories(&self) -> &[Category] {
        self.collection.categories()
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.dispatcher.mode()
    }

    /// 以後端的完整快照取代本地 Collection
    ///
    /// Waits for every submitted plan first, so the snapshot already holds
    /// the orders applied locally. Outcomes stay queued for `settle`.
    pub async fn refresh(&mut self) -> Result<()> {
        self.dispatcher.flush().await?;
        let categories = self.backend.fetch_categories().await?;
        self.collection = Collection::from_categories(categories)?;
        tracing::info!(
            "🔄 Loaded {} categories with {} sites",
            self.collection.len(),
            self.collection.site_count()
        );
        Ok(())
    }

    /// Computes the effect of a drop without touching local state or the
    /// backend.
    pub fn preview_drop(&self, source: DragRef, target: Option<DragRef>) -> Result<Option<Reordered>> {
        match classify(source, target, &self.collection)? {
            Classification::NoOp => Ok(None),
            Classification::Move(requested) => Ok(apply(&self.collection, &requested)),
        }
    }

    /// 處理一次拖曳結束事件
    ///
    /// The new arrangement replaces the local collection before any network
    /// call is made; the persistence plan is handed to the dispatcher and not
    /// awaited. Only malformed drag tokens are returned as errors.
    pub fn handle_drop(&mut self, source: &str, target: Option<&str>) -> Result<DropOutcome> {
        let source: DragRef = source.parse()?;
        let target = target.map(str::parse::<DragRef>).transpose()?;
        self.drop_refs(source, target)
    }

    pub fn drop_refs(&mut self, source: DragRef, target: Option<DragRef>) -> Result<DropOutcome> {
        let classified = match classify(source, target, &self.collection) {
            Ok(classified) => classified,
            Err(e @ OrganizerError::StaleReference { .. }) => {
                tracing::warn!("Ignoring drop of {}: {}", source, e);
                return Ok(DropOutcome::Ignored(IgnoreReason::StaleReference));
            }
            Err(e) => return Err(e),
        };

        let requested = match classified {
            Classification::NoOp => return Ok(DropOutcome::Ignored(IgnoreReason::NoTarget)),
            Classification::Move(requested) => requested,
        };

        let Some(Reordered { collection, plan }) = apply(&self.collection, &requested) else {
            tracing::debug!("Drop of {} left the order unchanged", source);
            return Ok(DropOutcome::Ignored(IgnoreReason::Unchanged));
        };

        // 送出失敗時保留原本的 Collection
        let ticket = self.dispatcher.submit(plan.clone())?;
        self.collection = collection;
        tracing::info!(ticket, "Applied {:?} ({} backend calls queued)", requested, plan.len());

        Ok(DropOutcome::Applied { ticket, plan })
    }

    /// URLs of a category's sites in display order, for opening them all at
    /// once.
    pub fn site_urls(&self, id: CategoryId) -> Result<Vec<&str>> {
        let category = self
            .collection
            .category(id)
            .ok_or(OrganizerError::StaleReference {
                kind: "category",
                id: id.0,
            })?;
        Ok(category.sites.iter().map(|s| s.url.as_str()).collect())
    }

    /// Outcomes are buffered until read here or by `settle`; callers that
    /// only drop should drain them periodically.
    pub fn try_next_outcome(&mut self) -> Option<SyncOutcome> {
        self.dispatcher.try_next_outcome()
    }

    pub async fn next_outcome(&mut self) -> Option<SyncOutcome> {
        self.dispatcher.next_outcome().await
    }

    /// 等待所有已提交的 plan 結束；若有失敗就重新抓取以重新同步
    pub async fn settle(&mut self) -> Result<SettleReport> {
        self.dispatcher.flush().await?;

        let mut report = SettleReport::default();
        for outcome in self.dispatcher.drain_outcomes() {
            if outcome.is_failure() {
                report.failures.push(outcome);
            } else {
                report.committed += 1;
            }
        }

        if !report.failures.is_empty() {
            tracing::warn!(
                "{} plan(s) failed to persist, reloading from backend",
                report.failures.len()
            );
            self.refresh().await?;
            report.refetched = true;
        }

        Ok(report)
    }

    pub async fn create_category(&mut self, name: &str) -> Result<Category> {
        validate_user_text("name", name)?;
        let created = self.backend.create_category(name.trim()).await;
        let created = self.resync_on_error(created).await?;
        tracing::info!("Created category {} ({})", created.name, created.id);
        self.refresh().await?;
        Ok(created)
    }

    pub async fn create_site(&mut self, site: NewSite) -> Result<Site> {
        validate_user_text("title", &site.title)?;
        validate_site_url(&site.url)?;
        if self.collection.category(site.category_id).is_none() {
            return Err(OrganizerError::StaleReference {
                kind: "category",
                id: site.category_id.0,
            });
        }
        let created = self.backend.create_site(&site).await;
        let created = self.resync_on_error(created).await?;
        tracing::info!("Created site {} ({})", created.title, created.id);
        self.refresh().await?;
        Ok(created)
    }

    pub async fn rename_category(&mut self, id: CategoryId, name: &str) -> Result<()> {
        validate_user_text("name", name)?;
        let renamed = self.backend.rename_category(id, name.trim()).await;
        self.resync_on_error(renamed).await?;
        self.refresh().await
    }

    pub async fn rename_site(&mut self, id: SiteId, title: &str) -> Result<()> {
        validate_user_text("title", title)?;
        let renamed = self.backend.rename_site(id, title.trim()).await;
        self.resync_on_error(renamed).await?;
        self.refresh().await
    }

    pub async fn delete_category(&mut self, id: CategoryId) -> Result<()> {
        let deleted = self.backend.delete_category(id).await;
        self.resync_on_error(deleted).await?;
        self.refresh().await
    }

    pub async fn delete_site(&mut self, id: SiteId) -> Result<()> {
        let deleted = self.backend.delete_site(id).await;
        self.resync_on_error(deleted).await?;
        self.refresh().await
    }

    /// 後端拒絕時重新抓取，再回傳原本的錯誤
    async fn resync_on_error<T>(&mut self, result: Result<T>) -> Result<T> {
        let needs_refetch = matches!(&result, Err(e) if e.requires_refetch());
        if needs_refetch {
            if let Err(refetch) = self.refresh().await {
                tracing::warn!("Reload after failed request also failed: {}", refetch);
            }
        }
        result
    }

    pub async fn shutdown(self) {
        self.dispatcher.shutdown().await;
    }
}
