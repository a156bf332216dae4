//! Product catalog client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ProductId;
use domain::Money;

use super::ClientError;

/// Catalog data for one product.
#[derive(Debug, Clone)]
pub struct ProductInfo {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub image: String,
}

/// Client for the product catalog domain.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns the authoritative price, name and image for a product.
    async fn product_info(&self, id: ProductId) -> Result<ProductInfo, ClientError>;

    /// Synchronous availability check used at reservation time.
    async fn check_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ClientError>;
}

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, ProductInfo>,
    unavailable: bool,
}

/// In-memory catalog for wiring and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn put_product(&self, id: ProductId, name: impl Into<String>, price: Money, stock: u32) {
        let mut state = self.state.write().unwrap();
        state.products.insert(
            id,
            ProductInfo {
                id,
                name: name.into(),
                price,
                stock,
                image: format!("https://static.example.com/products/{id}.png"),
            },
        );
    }

    /// Overwrites the available stock of a product.
    pub fn set_stock(&self, id: ProductId, stock: u32) {
        let mut state = self.state.write().unwrap();
        if let Some(product) = state.products.get_mut(&id) {
            product.stock = stock;
        }
    }

    /// Makes every call fail, simulating an unreachable collaborator.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn product_info(&self, id: ProductId) -> Result<ProductInfo, ClientError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(ClientError::new("product catalog unreachable"));
        }
        state
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::new(format!("product {id} unknown")))
    }

    async fn check_stock(&self, id: ProductId, quantity: u32) -> Result<bool, ClientError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(ClientError::new("product catalog unreachable"));
        }
        Ok(state
            .products
            .get(&id)
            .is_some_and(|p| p.stock >= quantity))
    }
}
