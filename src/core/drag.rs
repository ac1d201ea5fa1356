use crate::domain::model::{CategoryId, Collection, SiteId};
use crate::utils::error::{OrganizerError, Result};
use std::fmt;
use std::str::FromStr;

/// Drag endpoint, parsed once from the `"category-<id>"` / `"site-<id>"`
/// tokens the drag surface hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragRef {
    Category(CategoryId),
    Site(SiteId),
}

impl DragRef {
    pub fn kind(&self) -> &'static str {
        match self {
            DragRef::Category(_) => "category",
            DragRef::Site(_) => "site",
        }
    }
}

impl FromStr for DragRef {
    type Err = OrganizerError;

    fn from_str(token: &str) -> Result<Self> {
        let invalid = |reason: &str| OrganizerError::InvalidDragRef {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        let (kind, raw_id) = token
            .trim()
            .split_once('-')
            .ok_or_else(|| invalid("expected '<kind>-<id>'"))?;

        let parse_id = || {
            raw_id
                .parse::<i64>()
                .map_err(|_| invalid("identifier is not an integer"))
        };

        // 先確認種類，再解析數字
        match kind {
            "category" => Ok(DragRef::Category(CategoryId(parse_id()?))),
            "site" => Ok(DragRef::Site(SiteId(parse_id()?))),
            _ => Err(invalid("kind must be 'category' or 'site'")),
        }
    }
}

impl fmt::Display for DragRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragRef::Category(id) => write!(f, "category-{}", id),
            DragRef::Site(id) => write!(f, "site-{}", id),
        }
    }
}

/// A classified drag gesture. Indices refer to the collection the move was
/// classified against; the reorder engine clamps them if they went stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    CategoryReorder {
        category: CategoryId,
        from: usize,
        to: usize,
    },
    IntraContainerReorder {
        container: CategoryId,
        site: SiteId,
        from: usize,
        to: usize,
    },
    CrossContainerMove {
        site: SiteId,
        source: CategoryId,
        dest: CategoryId,
        from: usize,
        to: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Move(Move),
    NoOp,
}

fn stale_category(id: CategoryId) -> OrganizerError {
    OrganizerError::StaleReference {
        kind: "category",
        id: id.0,
    }
}

fn stale_site(id: SiteId) -> OrganizerError {
    OrganizerError::StaleReference { kind: "site", id: id.0 }
}

/// 判斷拖曳手勢的種類並解析來源/目的容器
///
/// Returns `StaleReference` when either endpoint is no longer in the
/// collection; callers treat that as a no-op.
pub fn classify(
    source: DragRef,
    target: Option<DragRef>,
    collection: &Collection,
) -> Result<Classification> {
    let target = match target {
        Some(target) if target != source => target,
        _ => return Ok(Classification::NoOp),
    };

    match source {
        DragRef::Category(category) => {
            let from = collection
                .category_position(category)
                .ok_or_else(|| stale_category(category))?;

            // 類別拖到某個 site 上：視為拖到該 site 所屬的類別
            let target_category = match target {
                DragRef::Category(id) => id,
                DragRef::Site(site) => collection.site_owner(site).ok_or_else(|| stale_site(site))?,
            };
            let to = collection
                .category_position(target_category)
                .ok_or_else(|| stale_category(target_category))?;

            if from == to {
                return Ok(Classification::NoOp);
            }

            tracing::debug!(%category, from, to, "classified category reorder");
            Ok(Classification::Move(Move::CategoryReorder { category, from, to }))
        }
        DragRef::Site(site) => {
            let (source_position, from) = collection
                .site_position(site)
                .ok_or_else(|| stale_site(site))?;
            let source_container = collection.categories()[source_position].id;

            let (dest, to) = match target {
                DragRef::Category(id) => {
                    let dest = collection.category(id).ok_or_else(|| stale_category(id))?;
                    (id, dest.sites.len())
                }
                DragRef::Site(target_site) => {
                    let (dest_position, to) = collection
                        .site_position(target_site)
                        .ok_or_else(|| stale_site(target_site))?;
                    (collection.categories()[dest_position].id, to)
                }
            };

            let classified = if dest == source_container {
                Move::IntraContainerReorder {
                    container: dest,
                    site,
                    from,
                    to,
                }
            } else {
                Move::CrossContainerMove {
                    site,
                    source: source_container,
                    dest,
                    from,
                    to,
                }
            };

            tracing::debug!(?classified, "classified site drag");
            Ok(Classification::Move(classified))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Category, Site};

    fn collection() -> Collection {
        let site = |id: i64| Site {
            id: SiteId(id),
            title: format!("site {}", id),
            url: format!("https://s{}.example.com", id),
            category_id: CategoryId::default(),
            order: 0,
            favicon_url: None,
        };
        Collection::from_categories(vec![
            Category {
                id: CategoryId(1),
                name: "A".to_string(),
                order: 0,
                sites: vec![site(10), site(11), site(12)],
            },
            Category {
                id: CategoryId(2),
                name: "B".to_string(),
                order: 1,
                sites: vec![site(20)],
            },
            Category {
                id: CategoryId(3),
                name: "C".to_string(),
                order: 2,
                sites: vec![],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_drag_refs() {
        assert_eq!("category-4".parse::<DragRef>().unwrap(), DragRef::Category(CategoryId(4)));
        assert_eq!("site-12".parse::<DragRef>().unwrap(), DragRef::Site(SiteId(12)));
        assert_eq!(DragRef::Site(SiteId(12)).to_string(), "site-12");

        for bad in ["folder-1", "site-", "site-abc", "category", "12", ""] {
            let err = bad.parse::<DragRef>().unwrap_err();
            assert!(matches!(err, OrganizerError::InvalidDragRef { .. }), "{}", bad);
        }
    }

    #[test]
    fn test_same_source_and_target_is_noop() {
        let collection = collection();
        for endpoint in [
            DragRef::Category(CategoryId(1)),
            DragRef::Site(SiteId(11)),
            // 不存在的項目也一樣
            DragRef::Site(SiteId(404)),
        ] {
            let result = classify(endpoint, Some(endpoint), &collection).unwrap();
            assert_eq!(result, Classification::NoOp);
        }
    }

    #[test]
    fn test_missing_target_is_noop() {
        let result = classify(DragRef::Site(SiteId(10)), None, &collection()).unwrap();
        assert_eq!(result, Classification::NoOp);
    }

    #[test]
    fn test_category_onto_category() {
        let result = classify(
            DragRef::Category(CategoryId(3)),
            Some(DragRef::Category(CategoryId(1))),
            &collection(),
        )
        .unwrap();
        assert_eq!(
            result,
            Classification::Move(Move::CategoryReorder {
                category: CategoryId(3),
                from: 2,
                to: 0
            })
        );
    }

    #[test]
    fn test_category_onto_site_uses_owning_category() {
        let collection = collection();
        let result = classify(
            DragRef::Category(CategoryId(1)),
            Some(DragRef::Site(SiteId(20))),
            &collection,
        )
        .unwrap();
        assert_eq!(
            result,
            Classification::Move(Move::CategoryReorder {
                category: CategoryId(1),
                from: 0,
                to: 1
            })
        );

        let own_site = classify(
            DragRef::Category(CategoryId(1)),
            Some(DragRef::Site(SiteId(12))),
            &collection,
        )
        .unwrap();
        assert_eq!(own_site, Classification::NoOp);
    }

    #[test]
    fn test_site_onto_site_in_same_category() {
        let result = classify(
            DragRef::Site(SiteId(10)),
            Some(DragRef::Site(SiteId(12))),
            &collection(),
        )
        .unwrap();
        assert_eq!(
            result,
            Classification::Move(Move::IntraContainerReorder {
                container: CategoryId(1),
                site: SiteId(10),
                from: 0,
                to: 2
            })
        );
    }

    #[test]
    fn test_site_onto_other_category_appends() {
        let result = classify(
            DragRef::Site(SiteId(11)),
            Some(DragRef::Category(CategoryId(2))),
            &collection(),
        )
        .unwrap();
        assert_eq!(
            result,
            Classification::Move(Move::CrossContainerMove {
                site: SiteId(11),
                source: CategoryId(1),
                dest: CategoryId(2),
                from: 1,
                to: 1
            })
        );
    }

    #[test]
    fn test_site_onto_empty_category_targets_index_zero() {
        let result = classify(
            DragRef::Site(SiteId(20)),
            Some(DragRef::Category(CategoryId(3))),
            &collection(),
        )
        .unwrap();
        assert!(matches!(
            result,
            Classification::Move(Move::CrossContainerMove { to: 0, .. })
        ));
    }

    #[test]
    fn test_site_onto_site_in_other_category() {
        let result = classify(
            DragRef::Site(SiteId(20)),
            Some(DragRef::Site(SiteId(11))),
            &collection(),
        )
        .unwrap();
        assert_eq!(
            result,
            Classification::Move(Move::CrossContainerMove {
                site: SiteId(20),
                source: CategoryId(2),
                dest: CategoryId(1),
                from: 0,
                to: 1
            })
        );
    }

    #[test]
    fn test_dangling_references_are_stale() {
        let collection = collection();
        let cases = [
            (DragRef::Site(SiteId(99)), DragRef::Category(CategoryId(1))),
            (DragRef::Site(SiteId(10)), DragRef::Category(CategoryId(99))),
            (DragRef::Site(SiteId(10)), DragRef::Site(SiteId(99))),
            (DragRef::Category(CategoryId(99)), DragRef::Category(CategoryId(1))),
            (DragRef::Category(CategoryId(1)), DragRef::Site(SiteId(99))),
        ];

        for (source, target) in cases {
            let err = classify(source, Some(target), &collection).unwrap_err();
            assert!(
                matches!(err, OrganizerError::StaleReference { .. }),
                "{} -> {}",
                source,
                target
            );
        }
    }
}
