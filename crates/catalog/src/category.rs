use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainError, DomainResult, Entity};

use crate::slug::slugify;

/// Catalog category. `sort_order` defines display order (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub sort_order: u32,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Category {
    /// New category placed after every existing one.
    pub fn append(id: CategoryId, name: &str, existing: &[Category]) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name_required", "category name is required"));
        }

        let sort_order = existing.iter().map(|c| c.sort_order).max().unwrap_or(0) + 1;
        Ok(Self {
            id,
            name: name.to_string(),
            slug: slugify(name),
            sort_order,
        })
    }

    /// Deletion guard: a category referenced by any product stays.
    pub fn ensure_deletable(product_count: u64) -> DomainResult<()> {
        if product_count > 0 {
            return Err(DomainError::CategoryInUse { product_count });
        }
        Ok(())
    }
}

/// Assign `sort_order = index + 1` following `ordered_ids`.
///
/// `ordered_ids` must name every category exactly once.
pub fn reorder(categories: &mut [Category], ordered_ids: &[CategoryId]) -> DomainResult<()> {
    if ordered_ids.len() != categories.len() {
        return Err(DomainError::validation(
            "invalid_order",
            "reorder must list every category exactly once",
        ));
    }

    let mut positions = Vec::with_capacity(categories.len());
    for category in categories.iter() {
        let idx = ordered_ids
            .iter()
            .position(|id| *id == category.id)
            .ok_or(DomainError::CategoryNotFound)?;
        positions.push(idx);
    }

    let mut seen = positions.clone();
    seen.sort_unstable();
    seen.dedup();
    if seen.len() != positions.len() {
        return Err(DomainError::validation(
            "invalid_order",
            "reorder lists a category twice",
        ));
    }

    for (category, idx) in categories.iter_mut().zip(positions) {
        category.sort_order = idx as u32 + 1;
    }
    categories.sort_by_key(|c| c.sort_order);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(names: &[&str]) -> Vec<Category> {
        let mut out: Vec<Category> = Vec::new();
        for name in names {
            let c = Category::append(CategoryId::new(), name, &out).unwrap();
            out.push(c);
        }
        out
    }

    #[test]
    fn append_uses_next_sort_order() {
        let list = cats(&["Shirts", "Shoes"]);
        assert_eq!(list[0].sort_order, 1);
        assert_eq!(list[1].sort_order, 2);
        assert_eq!(list[1].slug, "shoes");
    }

    #[test]
    fn in_use_category_cannot_be_deleted() {
        assert!(Category::ensure_deletable(0).is_ok());
        match Category::ensure_deletable(2) {
            Err(DomainError::CategoryInUse { product_count }) => assert_eq!(product_count, 2),
            other => panic!("expected CategoryInUse, got {other:?}"),
        }
    }

    #[test]
    fn reorder_assigns_positions() {
        let mut list = cats(&["A", "B", "C"]);
        let ids = vec![list[2].id, list[0].id, list[1].id];

        reorder(&mut list, &ids).unwrap();

        assert_eq!(list.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["C", "A", "B"]);
        assert_eq!(list.iter().map(|c| c.sort_order).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn reorder_rejects_partial_lists() {
        let mut list = cats(&["A", "B"]);
        let ids = vec![list[0].id];
        assert_eq!(reorder(&mut list, &ids).unwrap_err().code(), "invalid_order");

        let dup = vec![list[0].id, list[0].id];
        assert!(reorder(&mut list, &dup).is_err());
    }
}
