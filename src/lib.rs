pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::{CliConfig, Command};

pub use crate::adapters::RestBackend;
pub use crate::config::{toml_config::TomlConfig, Settings};
pub use crate::core::drag::{classify, Classification, DragRef, Move};
pub use crate::core::organizer::{DropOutcome, IgnoreReason, Organizer, SettleReport};
pub use crate::core::reorder::{apply, PersistCall, PersistencePlan, Reordered};
pub use crate::core::sync::{execute_plan, SyncDispatcher, SyncOutcome, Ticket};
pub use crate::domain::model::{Category, CategoryId, Collection, NewSite, OrderEntry, Site, SiteId};
pub use crate::domain::ports::{Catalog, ConfigProvider, OrderStore, SyncMode};
pub use crate::utils::error::{OrganizerError, Result};
