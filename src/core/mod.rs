pub mod drag;
pub mod organizer;
pub mod reorder;
pub mod sync;

pub use crate::domain::model::{Category, CategoryId, Collection, Site, SiteId};
pub use crate::domain::ports::{Catalog, ConfigProvider, OrderStore, SyncMode};
pub use crate::utils::error::Result;
