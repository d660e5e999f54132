//! Inventory management route handlers: products and categories.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use zypso_core::{CategoryId, Product, ProductId, ProductStatus};

use crate::error::{AppError, add_breadcrumb};
use crate::inventory::{self, InventoryError, NewProductForm, PRODUCT_ADDED, ProductEditForm};
use crate::routes::{ConfirmTemplate, FlashParams, is_htmx, render};
use crate::state::AppState;

/// Form input for the stock toggle.
#[derive(Debug, Deserialize)]
pub struct StockForm {
    pub status: String,
}

/// Form input for a new category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
}

/// One `<option>` of the stock toggle.
#[derive(Debug, Clone)]
pub struct StockOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Product row for templates.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub unit: String,
    pub category: String,
    pub image: Option<String>,
    pub stock: Vec<StockOption>,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        // Legacy "Out of Stock" shows as Unavailable.
        let current = if product.is_available() {
            ProductStatus::Available
        } else {
            ProductStatus::Unavailable
        };

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            unit: product.unit.clone(),
            category: product.category.clone(),
            image: product.image_url.clone(),
            stock: ProductStatus::TOGGLE_OPTIONS
                .into_iter()
                .map(|status| StockOption {
                    value: status.as_str(),
                    selected: status == current,
                })
                .collect(),
        }
    }
}

/// Category row for templates.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
}

/// Inventory page template.
#[derive(Template)]
#[template(path = "inventory.html")]
pub struct InventoryTemplate {
    pub current_path: String,
    pub products: Vec<ProductRow>,
    pub categories: Vec<CategoryRow>,
    /// Values of the add-product form, kept when it is rejected.
    pub form: NewProductForm,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

/// Product edit template.
#[derive(Template)]
#[template(path = "product_edit.html")]
pub struct ProductEditTemplate {
    pub current_path: String,
    pub id: String,
    pub name: String,
    pub price: String,
    pub unit: String,
    pub image_url: String,
    pub error_message: Option<String>,
}

/// Build the inventory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(index))
        .route("/inventory/products", post(create_product))
        .route("/inventory/products/{id}", post(update_product))
        .route("/inventory/products/{id}/edit", get(edit_page))
        .route("/inventory/products/{id}/stock", post(set_stock))
        .route(
            "/inventory/products/{id}/delete",
            get(confirm_delete_product).post(delete_product),
        )
        .route("/inventory/categories", post(create_category))
        .route(
            "/inventory/categories/{id}/delete",
            get(confirm_delete_category).post(delete_category),
        )
}

fn success_text(code: &str) -> String {
    match code {
        "product_added" => PRODUCT_ADDED.to_owned(),
        "product_updated" => "Product updated.".to_owned(),
        "product_deleted" => "Product deleted.".to_owned(),
        "category_added" => "Category added.".to_owned(),
        "category_deleted" => "Category deleted.".to_owned(),
        _ => code.to_owned(),
    }
}

fn error_text(code: &str) -> String {
    match code {
        "category_name" => InventoryError::MissingCategoryName.to_string(),
        _ => code.to_owned(),
    }
}

fn inventory_page(
    state: &AppState,
    form: NewProductForm,
    success_message: Option<String>,
    error_message: Option<String>,
) -> InventoryTemplate {
    let mut products: Vec<ProductRow> = state
        .products()
        .current()
        .iter()
        .map(ProductRow::from)
        .collect();
    products.sort_by_key(|p| p.name.to_lowercase());

    let mut categories: Vec<CategoryRow> = state
        .categories()
        .current()
        .iter()
        .map(|c| CategoryRow {
            id: c.id.to_string(),
            name: c.name.clone(),
        })
        .collect();
    categories.sort_by_key(|c| c.name.to_lowercase());

    InventoryTemplate {
        current_path: "/inventory".to_string(),
        products,
        categories,
        form,
        success_message,
        error_message,
    }
}

/// Inventory overview.
///
/// GET /inventory
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<FlashParams>,
) -> Html<String> {
    render(&inventory_page(
        &state,
        NewProductForm::default(),
        params.success.as_deref().map(success_text),
        params.error.as_deref().map(error_text),
    ))
}

/// Add a product.
///
/// POST /inventory/products
#[instrument(skip(state, form), fields(name = %form.name))]
pub async fn create_product(
    State(state): State<AppState>,
    Form(form): Form<NewProductForm>,
) -> Response {
    let result = match form.validate() {
        Ok(product) => inventory::add_product(state.store(), &product)
            .await
            .map_err(InventoryError::from),
        Err(e) => Err(e),
    };

    match result {
        Ok(id) => {
            add_breadcrumb("inventory", "Product added", &[("product_id", id.as_str())]);
            Redirect::to("/inventory?success=product_added").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Product not added");
            let error = Some(e.to_string());
            render(&inventory_page(&state, form, None, error)).into_response()
        }
    }
}

/// Product edit form.
///
/// GET /inventory/products/{id}/edit
#[instrument(skip(state))]
pub async fn edit_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let products = state.products().current();
    let product = products
        .iter()
        .find(|p| p.id.as_str() == id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(render(&ProductEditTemplate {
        current_path: "/inventory".to_string(),
        id: product.id.to_string(),
        name: product.name.clone(),
        price: product.price.rupees().to_string(),
        unit: product.unit.clone(),
        image_url: product.image_url.clone().unwrap_or_default(),
        error_message: None,
    }))
}

/// Save a product edit.
///
/// POST /inventory/products/{id}
#[instrument(skip(state, form))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ProductEditForm>,
) -> Response {
    let product_id = ProductId::new(id);
    let result = match form.validate() {
        Ok(edit) => inventory::update_product(state.store(), &product_id, &edit)
            .await
            .map_err(InventoryError::from),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            add_breadcrumb(
                "inventory",
                "Product updated",
                &[("product_id", product_id.as_str())],
            );
            Redirect::to("/inventory?success=product_updated").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Product not updated");
            render(&ProductEditTemplate {
                current_path: "/inventory".to_string(),
                id: product_id.to_string(),
                name: form.name,
                price: form.price,
                unit: form.unit,
                image_url: form.image_url,
                error_message: Some(e.to_string()),
            })
            .into_response()
        }
    }
}

/// Toggle a product between Available and Unavailable.
///
/// POST /inventory/products/{id}/stock
#[instrument(skip(state, headers))]
pub async fn set_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<StockForm>,
) -> Result<Response, AppError> {
    let status: ProductStatus = form.status.parse().map_err(AppError::BadRequest)?;
    let product_id = ProductId::new(id);

    inventory::set_stock(state.store(), &product_id, status).await?;
    add_breadcrumb(
        "inventory",
        "Stock changed",
        &[("product_id", product_id.as_str()), ("status", status.as_str())],
    );

    if is_htmx(&headers) {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(Redirect::to("/inventory").into_response())
    }
}

/// Ask before deleting a product.
///
/// GET /inventory/products/{id}/delete
#[instrument(skip(state))]
pub async fn confirm_delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Html<String> {
    let name = state
        .products()
        .current()
        .iter()
        .find(|p| p.id.as_str() == id)
        .map(|p| p.name.clone());

    render(&ConfirmTemplate {
        current_path: "/inventory".to_string(),
        title: "Delete Product?".to_string(),
        prompt: name.map_or_else(
            || "This product will be removed from the shop.".to_string(),
            |name| format!("{name} will be removed from the shop."),
        ),
        action: format!("/inventory/products/{id}/delete"),
        back: "/inventory".to_string(),
    })
}

/// Delete a product.
///
/// POST /inventory/products/{id}/delete
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let product_id = ProductId::new(id);
    inventory::delete_product(state.store(), &product_id).await?;
    add_breadcrumb(
        "inventory",
        "Product deleted",
        &[("product_id", product_id.as_str())],
    );
    Ok(Redirect::to("/inventory?success=product_deleted"))
}

/// Add a category.
///
/// POST /inventory/categories
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect, AppError> {
    match inventory::add_category(state.store(), &form.name).await {
        Ok(id) => {
            add_breadcrumb("inventory", "Category added", &[("category_id", id.as_str())]);
            Ok(Redirect::to("/inventory?success=category_added"))
        }
        Err(InventoryError::MissingCategoryName) => {
            Ok(Redirect::to("/inventory?error=category_name"))
        }
        Err(InventoryError::Store(e)) => Err(e.into()),
        Err(e) => Err(AppError::BadRequest(e.to_string())),
    }
}

/// Ask before deleting a category.
///
/// GET /inventory/categories/{id}/delete
#[instrument(skip(state))]
pub async fn confirm_delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Html<String> {
    let name = state
        .categories()
        .current()
        .iter()
        .find(|c| c.id.as_str() == id)
        .map(|c| c.name.clone());

    render(&ConfirmTemplate {
        current_path: "/inventory".to_string(),
        title: "Delete Category?".to_string(),
        prompt: name.map_or_else(
            || "Products in this category keep their category name.".to_string(),
            |name| format!("{name} will be removed. Its products keep the category name."),
        ),
        action: format!("/inventory/categories/{id}/delete"),
        back: "/inventory".to_string(),
    })
}

/// Delete a category.
///
/// POST /inventory/categories/{id}/delete
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let category_id = CategoryId::new(id);
    inventory::delete_category(state.store(), &category_id).await?;
    add_breadcrumb(
        "inventory",
        "Category deleted",
        &[("category_id", category_id.as_str())],
    );
    Ok(Redirect::to("/inventory?success=category_deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_out_of_stock_selects_unavailable() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Rice",
            "price": 60,
            "status": "Out of Stock",
        }))
        .unwrap();

        let row = ProductRow::from(&product);
        let selected: Vec<_> = row.stock.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.first().unwrap().value, "Unavailable");
        assert!(row.image.is_none());
    }

    #[test]
    fn test_flash_codes() {
        assert_eq!(success_text("product_added"), "Product Added");
        assert_eq!(error_text("category_name"), "Category name is required");
    }
}
