use crate::utils::error::{OrganizerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub title: String,
    pub url: String,
    // 後端的 site 回應不一定帶 category_id，載入時由所屬 category 補上
    #[serde(default)]
    pub category_id: CategoryId,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub favicon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub sites: Vec<Site>,
}

/// `POST /api/update-order/*` 的單筆排序資料
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: i64,
    pub order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSiteRequest {
    pub site_id: SiteId,
    pub new_category_id: CategoryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSite {
    pub title: String,
    pub url: String,
    pub category_id: CategoryId,
}

/// Categories in display order, each owning its ordered sites.
///
/// Two lookup tables are kept next to the arena and rebuilt whenever the
/// arrangement changes: site id → owning category id, and category id →
/// position in the top-level sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    categories: Vec<Category>,
    site_owner: HashMap<SiteId, CategoryId>,
    category_position: HashMap<CategoryId, usize>,
}

impl Collection {
    /// 從後端快照建立 Collection；順序以後端回傳為準
    pub fn from_categories(mut categories: Vec<Category>) -> Result<Self> {
        let mut category_position = HashMap::with_capacity(categories.len());
        let mut site_owner = HashMap::new();

        for (position, category) in categories.iter_mut().enumerate() {
            if category_position.insert(category.id, position).is_some() {
                return Err(OrganizerError::InconsistentSnapshot {
                    message: format!("category {} appears more than once", category.id),
                });
            }

            for site in category.sites.iter_mut() {
                if site_owner.insert(site.id, category.id).is_some() {
                    return Err(OrganizerError::InconsistentSnapshot {
                        message: format!("site {} appears more than once", site.id),
                    });
                }
                site.category_id = category.id;
            }
        }

        Ok(Self {
            categories,
            site_owner,
            category_position,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn into_categories(self) -> Vec<Category> {
        self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn site_count(&self) -> usize {
        self.site_owner.len()
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.category_position(id).map(|position| &self.categories[position])
    }

    pub fn category_position(&self, id: CategoryId) -> Option<usize> {
        self.category_position.get(&id).copied()
    }

    pub fn site_owner(&self, id: SiteId) -> Option<CategoryId> {
        self.site_owner.get(&id).copied()
    }

    /// 回傳 (所屬 category 的位置, site 在該 category 內的位置)
    pub fn site_position(&self, id: SiteId) -> Option<(usize, usize)> {
        let owner = self.site_owner(id)?;
        let category_position = self.category_position(owner)?;
        let site_position = self.categories[category_position]
            .sites
            .iter()
            .position(|site| site.id == id)?;
        Some((category_position, site_position))
    }

    pub fn site(&self, id: SiteId) -> Option<&Site> {
        let (category_position, site_position) = self.site_position(id)?;
        self.categories[category_position].sites.get(site_position)
    }

    pub(crate) fn categories_mut(&mut self) -> &mut Vec<Category> {
        &mut self.categories
    }

    /// 重新排列後呼叫，讓索引與 arena 保持一致
    pub(crate) fn reindex(&mut self) {
        self.category_position.clear();
        self.site_owner.clear();
        for (position, category) in self.categories.iter().enumerate() {
            self.category_position.insert(category.id, position);
            for site in &category.sites {
                self.site_owner.insert(site.id, category.id);
            }
        }
    }
}
