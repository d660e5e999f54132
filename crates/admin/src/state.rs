//! Application state shared across handlers.

use std::sync::Arc;

use zypso_core::collections::{CATEGORIES, CREATED_AT, ORDERS, PRODUCTS, SHOP_CONTROL};
use zypso_core::format::ShopClock;
use zypso_core::{Category, Order, Product, SHOP_STATUS_DOCUMENT, ShopSettings};
use zypso_firebase::{Direction, DocumentMirror, DocumentStore, Projection, Query};

use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// The dashboard subscribes once to every order, the catalog, the
/// categories and the settings document; pages render from these
/// projections and writes go straight to the store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Arc<dyn DocumentStore>,
    orders: Projection<Order>,
    products: Projection<Product>,
    categories: Projection<Category>,
    settings: DocumentMirror<ShopSettings>,
}

impl AppState {
    /// Create the state and start the subscriptions.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: AdminConfig, store: Arc<dyn DocumentStore>) -> Self {
        let orders = Projection::spawn(
            ORDERS,
            store.subscribe(
                ORDERS,
                Query::all().order_by(CREATED_AT, Direction::Descending),
            ),
        );
        let products = Projection::spawn(PRODUCTS, store.subscribe(PRODUCTS, Query::all()));
        let categories = Projection::spawn(CATEGORIES, store.subscribe(CATEGORIES, Query::all()));
        let settings = DocumentMirror::spawn(
            SHOP_CONTROL,
            store.subscribe_document(SHOP_CONTROL, SHOP_STATUS_DOCUMENT),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                orders,
                products,
                categories,
                settings,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn clock(&self) -> &ShopClock {
        &self.inner.config.clock
    }

    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// All orders, newest first.
    #[must_use]
    pub fn orders(&self) -> &Projection<Order> {
        &self.inner.orders
    }

    #[must_use]
    pub fn products(&self) -> &Projection<Product> {
        &self.inner.products
    }

    #[must_use]
    pub fn categories(&self) -> &Projection<Category> {
        &self.inner.categories
    }

    #[must_use]
    pub fn settings_mirror(&self) -> &DocumentMirror<ShopSettings> {
        &self.inner.settings
    }

    /// Current shop settings; defaults until the document exists.
    #[must_use]
    pub fn settings(&self) -> ShopSettings {
        self.inner.settings.current().unwrap_or_default()
    }

    /// Whether every subscription has delivered its first snapshot.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.orders.is_loaded()
            && self.inner.products.is_loaded()
            && self.inner.categories.is_loaded()
            && self.inner.settings.is_loaded()
    }
}
