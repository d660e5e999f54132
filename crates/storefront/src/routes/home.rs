//! Catalog page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tower_sessions::Session;
use tracing::instrument;
use url::form_urlencoded;

use zypso_core::Product;
use zypso_core::models::product::PLACEHOLDER_IMAGE;

use crate::catalog::{CatalogFilter, category_chips};
use crate::middleware::OptionalAuth;
use crate::routes::PageChrome;
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub unit: String,
    pub image: String,
    pub available: bool,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            unit: product.unit.clone(),
            image: product
                .image_url
                .clone()
                .unwrap_or_else(|| format!("/static/{PLACEHOLDER_IMAGE}")),
            available: product.is_available(),
        }
    }
}

/// Category chip display data; `query` is the encoded query string it
/// selects.
#[derive(Debug, Clone)]
pub struct ChipView {
    pub label: String,
    pub query: String,
    pub active: bool,
}

/// The filtered grid with its chips and search box.
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub products: Vec<ProductCard>,
    pub chips: Vec<ChipView>,
    pub search: String,
    pub selected: String,
    /// Encoded query string reproducing this view.
    pub query: String,
}

impl CatalogView {
    /// Render the current catalog snapshot through `filter`.
    #[must_use]
    pub fn build(state: &AppState, filter: &CatalogFilter) -> Self {
        let products = state.products().current();
        let categories = state.categories().current();
        let selected = filter.selected_category();
        let search = filter.search();

        let chips = category_chips(&categories, selected)
            .into_iter()
            .map(|chip| ChipView {
                query: encode_query(&chip.value, search),
                label: chip.label,
                active: chip.active,
            })
            .collect();

        Self {
            products: filter
                .apply(&products)
                .into_iter()
                .map(ProductCard::from)
                .collect(),
            chips,
            search: search.to_string(),
            selected: selected.to_string(),
            query: encode_query(selected, search),
        }
    }
}

fn encode_query(category: &str, search: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("category", category)
        .append_pair("q", search)
        .finish()
}

/// Full catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub chrome: PageChrome,
    pub catalog: CatalogView,
    pub cart: CartView,
}

/// Catalog fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/catalog.html")]
pub struct CatalogTemplate {
    pub catalog: CatalogView,
}

/// Display the catalog page.
#[instrument(skip(state, session, customer))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(filter): Query<CatalogFilter>,
) -> IndexTemplate {
    let cart = crate::cart::load(&session).await;
    IndexTemplate {
        chrome: PageChrome::load(&state, &session, customer.as_ref()).await,
        catalog: CatalogView::build(&state, &filter),
        cart: CartView::new(&cart, &state.settings()),
    }
}

/// Catalog fragment: chips and grid.
#[instrument(skip(state))]
pub async fn catalog(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> CatalogTemplate {
    CatalogTemplate {
        catalog: CatalogView::build(&state, &filter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zypso_core::{Price, ProductId, ProductStatus};

    #[test]
    fn test_product_card_placeholder_and_availability() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Paneer".to_string(),
            price: Price::new(90),
            unit: "200g".to_string(),
            category: "Dairy".to_string(),
            status: ProductStatus::Unavailable,
            image_url: None,
            created_at: None,
        };

        let card = ProductCard::from(&product);
        assert_eq!(card.image, "/static/placeholder.png");
        assert_eq!(card.price, "₹90");
        assert!(!card.available);
    }

    #[test]
    fn test_encode_query_escapes_search() {
        assert_eq!(
            encode_query("Dairy & Eggs", "brown bread"),
            "category=Dairy+%26+Eggs&q=brown+bread"
        );
    }
}
