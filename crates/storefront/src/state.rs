//! Application state shared across handlers.

use std::sync::Arc;

use zypso_core::collections::{CATEGORIES, PRODUCTS, SHOP_CONTROL};
use zypso_core::format::ShopClock;
use zypso_core::{Category, Product, SHOP_STATUS_DOCUMENT, ShopSettings};
use zypso_firebase::{AuthProvider, Backend, DocumentMirror, DocumentStore, Projection, Query};

use crate::config::StorefrontConfig;
use crate::orders::CustomerOrders;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the backend clients and the live
/// projections every page renders from: the catalog, the categories and
/// the shop settings are subscribed once at startup; customer order feeds
/// are started per sign-in.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    products: Projection<Product>,
    categories: Projection<Category>,
    settings: DocumentMirror<ShopSettings>,
    customer_orders: CustomerOrders,
}

impl AppState {
    /// Create the state and start the shared subscriptions.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: StorefrontConfig, backend: Backend) -> Self {
        let Backend { store, auth } = backend;

        let products = Projection::spawn(PRODUCTS, store.subscribe(PRODUCTS, Query::all()));
        let categories = Projection::spawn(CATEGORIES, store.subscribe(CATEGORIES, Query::all()));
        let settings = DocumentMirror::spawn(
            SHOP_CONTROL,
            store.subscribe_document(SHOP_CONTROL, SHOP_STATUS_DOCUMENT),
        );
        let customer_orders = CustomerOrders::new(Arc::clone(&store));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                auth,
                products,
                categories,
                settings,
                customer_orders,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The shop's wall clock.
    #[must_use]
    pub fn clock(&self) -> &ShopClock {
        &self.inner.config.clock
    }

    /// Document store, acting as an anonymous client.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Email/password identity service.
    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }

    /// Live product catalog.
    #[must_use]
    pub fn products(&self) -> &Projection<Product> {
        &self.inner.products
    }

    /// Live category list.
    #[must_use]
    pub fn categories(&self) -> &Projection<Category> {
        &self.inner.categories
    }

    /// Live shop settings mirror.
    #[must_use]
    pub fn settings_mirror(&self) -> &DocumentMirror<ShopSettings> {
        &self.inner.settings
    }

    /// Current shop settings; defaults until the document exists.
    #[must_use]
    pub fn settings(&self) -> ShopSettings {
        self.inner.settings.current().unwrap_or_default()
    }

    /// Per-customer order feeds.
    #[must_use]
    pub fn customer_orders(&self) -> &CustomerOrders {
        &self.inner.customer_orders
    }

    /// Whether every shared subscription has delivered its first snapshot.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.products.is_loaded()
            && self.inner.categories.is_loaded()
            && self.inner.settings.is_loaded()
    }
}
