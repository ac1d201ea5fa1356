use crate::domain::model::{Category, CategoryId, NewSite, OrderEntry, Site, SiteId};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 持久化排序的三種呼叫；同步分派器只依賴這個介面
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn update_category_order(&self, entries: &[OrderEntry]) -> Result<()>;
    async fn update_site_order(&self, entries: &[OrderEntry]) -> Result<()>;
    async fn move_site(&self, site: SiteId, category: CategoryId) -> Result<()>;
}

/// 讀取完整快照與一般的 CRUD 操作
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn fetch_categories(&self) -> Result<Vec<Category>>;
    async fn create_category(&self, name: &str) -> Result<Category>;
    async fn rename_category(&self, id: CategoryId, name: &str) -> Result<()>;
    async fn delete_category(&self, id: CategoryId) -> Result<()>;
    async fn create_site(&self, site: &NewSite) -> Result<Site>;
    async fn rename_site(&self, id: SiteId, title: &str) -> Result<()>;
    async fn delete_site(&self, id: SiteId) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SyncMode {
    /// 單一 worker 依提交順序逐一執行
    #[default]
    Queued,
    /// 每個 plan 各自執行，可能亂序落地
    Concurrent,
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
    fn sync_mode(&self) -> SyncMode;
}
