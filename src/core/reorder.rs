use crate::core::drag::Move;
use crate::domain::model::{Category, CategoryId, Collection, OrderEntry, Site, SiteId};
use std::fmt;

/// A single backend call needed to make a local rearrangement durable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistCall {
    /// `POST /api/update-order/categories`
    CategoryOrder(Vec<OrderEntry>),
    /// `POST /api/update-order/sites`, one container at a time
    SiteOrder {
        category: CategoryId,
        entries: Vec<OrderEntry>,
    },
    /// `POST /api/move-site`
    MoveSite { site: SiteId, category: CategoryId },
}

impl PersistCall {
    pub fn label(&self) -> String {
        match self {
            PersistCall::CategoryOrder(_) => "update-order/categories".to_string(),
            PersistCall::SiteOrder { category, .. } => {
                format!("update-order/sites(category {})", category)
            }
            PersistCall::MoveSite { site, category } => {
                format!("move-site(site {} -> category {})", site, category)
            }
        }
    }
}

impl fmt::Display for PersistCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Ordered backend calls; issued strictly in sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistencePlan {
    calls: Vec<PersistCall>,
}

impl PersistencePlan {
    pub fn new(calls: Vec<PersistCall>) -> Self {
        Self { calls }
    }

    pub fn calls(&self) -> &[PersistCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reordered {
    pub collection: Collection,
    pub plan: PersistencePlan,
}

/// 從 `items` 移除 `from` 的元素，再插入到 `to`；索引一律夾在合法範圍內
///
/// Returns the final index of the moved element, or `None` when nothing
/// would change.
fn move_within<T>(items: &mut Vec<T>, from: usize, to: usize) -> Option<usize> {
    if items.is_empty() {
        return None;
    }
    let from = from.min(items.len() - 1);
    let to = to.min(items.len() - 1);
    if from == to {
        return None;
    }
    let item = items.remove(from);
    items.insert(to, item);
    Some(to)
}

fn renumber_categories(categories: &mut [Category]) -> Vec<OrderEntry> {
    categories
        .iter_mut()
        .enumerate()
        .map(|(index, category)| {
            category.order = index as i64;
            OrderEntry {
                id: category.id.0,
                order: category.order,
            }
        })
        .collect()
}

fn renumber_sites(sites: &mut [Site]) -> Vec<OrderEntry> {
    sites
        .iter_mut()
        .enumerate()
        .map(|(index, site)| {
            site.order = index as i64;
            OrderEntry {
                id: site.id.0,
                order: site.order,
            }
        })
        .collect()
}

/// 依據分類好的 Move 計算新的排列與對應的持久化計畫
///
/// Pure: the input collection is never mutated. Degenerate moves (dropping
/// onto the current slot, containers that no longer exist, empty sequences)
/// yield `None` and no plan.
pub fn apply(collection: &Collection, requested: &Move) -> Option<Reordered> {
    let mut next = collection.clone();

    let plan = match *requested {
        Move::CategoryReorder { from, to, .. } => {
            let categories = next.categories_mut();
            move_within(categories, from, to)?;
            let entries = renumber_categories(categories);
            PersistencePlan::new(vec![PersistCall::CategoryOrder(entries)])
        }
        Move::IntraContainerReorder {
            container,
            from,
            to,
            ..
        } => {
            let position = collection.category_position(container)?;
            let sites = &mut next.categories_mut()[position].sites;
            move_within(sites, from, to)?;
            let entries = renumber_sites(sites);
            PersistencePlan::new(vec![PersistCall::SiteOrder {
                category: container,
                entries,
            }])
        }
        Move::CrossContainerMove {
            source,
            dest,
            from,
            to,
            ..
        } => {
            if source == dest {
                return None;
            }
            let source_position = collection.category_position(source)?;
            let dest_position = collection.category_position(dest)?;
            let categories = next.categories_mut();

            let source_sites = &mut categories[source_position].sites;
            if source_sites.is_empty() {
                return None;
            }
            let mut moved = source_sites.remove(from.min(source_sites.len() - 1));
            let source_entries = renumber_sites(source_sites);

            moved.category_id = dest;
            let moved_id = moved.id;
            let dest_sites = &mut categories[dest_position].sites;
            let to = to.min(dest_sites.len());
            dest_sites.insert(to, moved);
            let dest_entries = renumber_sites(dest_sites);

            // 順序固定：來源排序 → 目的排序 → move-site
            PersistencePlan::new(vec![
                PersistCall::SiteOrder {
                    category: source,
                    entries: source_entries,
                },
                PersistCall::SiteOrder {
                    category: dest,
                    entries: dest_entries,
                },
                PersistCall::MoveSite {
                    site: moved_id,
                    category: dest,
                },
            ])
        }
    };

    next.reindex();
    tracing::debug!(calls = plan.len(), "computed persistence plan for {:?}", requested);
    Some(Reordered {
        collection: next,
        plan,
    })
}
