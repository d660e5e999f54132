//! Catalog filtering and category chips.
//!
//! The product and category lists are live projections held in
//! [`AppState`](crate::state::AppState); everything here is a pure function
//! over the current snapshot.

use serde::Deserialize;

use zypso_core::{Category, Product};

/// Category value that matches every product.
pub const ALL_CATEGORIES: &str = "all";

/// Grid filter from the `?category=&q=` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    /// Selected category name, or `all`.
    #[serde(default)]
    pub category: Option<String>,
    /// Search text matched against product names.
    #[serde(default)]
    pub q: Option<String>,
}

impl CatalogFilter {
    /// The selected category, `all` when none is given.
    #[must_use]
    pub fn selected_category(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(ALL_CATEGORIES)
    }

    /// The search text, empty when none is given.
    #[must_use]
    pub fn search(&self) -> &str {
        self.q.as_deref().unwrap_or_default()
    }

    /// Whether `product` passes both the category and the search filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let category = self.selected_category();
        let in_category = category == ALL_CATEGORIES || product.category == category;
        in_category
            && product
                .name
                .to_lowercase()
                .contains(&self.search().to_lowercase())
    }

    /// The products that pass the filter, in snapshot order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

/// A category button above the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChip {
    pub label: String,
    pub value: String,
    pub active: bool,
}

/// `All` followed by every category, with `selected` marked active.
#[must_use]
pub fn category_chips(categories: &[Category], selected: &str) -> Vec<CategoryChip> {
    let all = CategoryChip {
        label: "All".to_string(),
        value: ALL_CATEGORIES.to_string(),
        active: selected == ALL_CATEGORIES,
    };

    std::iter::once(all)
        .chain(categories.iter().map(|category| CategoryChip {
            label: category.name.clone(),
            value: category.name.clone(),
            active: category.name == selected,
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use zypso_core::{CategoryId, Price, ProductId, ProductStatus};

    fn product(name: &str, category: &str) -> Product {
        Product {
            id: ProductId::new(name),
            name: name.to_string(),
            price: Price::new(10),
            unit: "piece".to_string(),
            category: category.to_string(),
            status: ProductStatus::Available,
            image_url: None,
            created_at: None,
        }
    }

    fn filter(category: Option<&str>, q: Option<&str>) -> CatalogFilter {
        CatalogFilter {
            category: category.map(String::from),
            q: q.map(String::from),
        }
    }

    #[test]
    fn test_filter_by_category_and_search() {
        let products = vec![
            product("Amul Milk", "Dairy"),
            product("Brown Bread", "Bakery"),
            product("Milk Bread", "Bakery"),
        ];

        let names = |f: &CatalogFilter| -> Vec<String> {
            f.apply(&products).iter().map(|p| p.name.clone()).collect()
        };

        assert_eq!(names(&filter(None, None)).len(), 3);
        assert_eq!(names(&filter(Some("all"), Some("MILK"))), vec!["Amul Milk", "Milk Bread"]);
        assert_eq!(names(&filter(Some("Bakery"), Some("milk"))), vec!["Milk Bread"]);
        assert!(names(&filter(Some("Fruit"), None)).is_empty());
    }

    #[test]
    fn test_empty_category_means_all() {
        let f = filter(Some(""), None);
        assert_eq!(f.selected_category(), ALL_CATEGORIES);
        assert!(f.matches(&product("Eggs", "Dairy")));
    }

    #[test]
    fn test_category_chips_mark_selected() {
        let categories = vec![
            Category {
                id: CategoryId::new("c1"),
                name: "Dairy".to_string(),
            },
            Category {
                id: CategoryId::new("c2"),
                name: "Bakery".to_string(),
            },
        ];

        let chips = category_chips(&categories, "Bakery");
        let labels: Vec<_> = chips.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["All", "Dairy", "Bakery"]);
        let active: Vec<_> = chips.iter().filter(|c| c.active).map(|c| c.value.as_str()).collect();
        assert_eq!(active, vec!["Bakery"]);

        let chips = category_chips(&categories, ALL_CATEGORIES);
        assert!(chips.first().is_some_and(|c| c.active));
    }
}
