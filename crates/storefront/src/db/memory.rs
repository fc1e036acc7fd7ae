//! In-process document stores.
//!
//! Used for local runs without a database and as the backing store for
//! service and HTTP tests. Each mutation runs under a single write lock, which
//! gives the same per-user atomicity as the single-statement SQL updates.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use emporium_core::pipeline::Pipeline;
use emporium_core::{ProductId, UserId};

use super::{ProductStore, RepositoryError, UserStore};
use crate::models::{CartItem, Order, OrderDraft, Product, User};

/// Product store held in memory.
#[derive(Default)]
pub struct MemoryProductStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl MemoryProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Price` if the price is above
    /// `Price::MAX_ITEM`.
    pub async fn insert(&self, product: Product) -> Result<(), RepositoryError> {
        product.price.within_item_limit()?;
        self.products.write().await.insert(product.id, product);
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(&id).cloned())
    }
}

/// User store held in memory.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn clash(existing: &User, candidate: &User) -> Option<&'static str> {
    if existing.email == candidate.email {
        Some("email")
    } else if existing.phone == candidate.phone {
        Some("phone")
    } else {
        None
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(self.users.read().await.values().any(|u| u.email == email))
    }

    async fn phone_exists(&self, phone: &str) -> Result<bool, RepositoryError> {
        Ok(self.users.read().await.values().any(|u| u.phone == phone))
    }

    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict("user already exists".to_string()));
        }
        if let Some(field) = users.values().find_map(|existing| clash(existing, user)) {
            return Err(RepositoryError::Conflict(format!("{field} already exists")));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(field) = users
            .values()
            .filter(|existing| existing.id != user.id)
            .find_map(|existing| clash(existing, user))
        {
            return Err(RepositoryError::Conflict(format!("{field} already exists")));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn append_to_cart(&self, id: UserId, item: &CartItem) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.cart.push(item.clone());
        Ok(())
    }

    async fn remove_from_cart(
        &self,
        id: UserId,
        product: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.cart.retain(|item| item.product_id != product);
        Ok(())
    }

    async fn checkout_cart(
        &self,
        id: UserId,
        draft: &OrderDraft,
    ) -> Result<Order, RepositoryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        // Build the order first so a failed total leaves the cart in place.
        let order = draft.clone().into_order(user.cart.clone())?;
        user.cart.clear();
        user.orders.push(order.clone());
        Ok(order)
    }

    async fn append_order(&self, id: UserId, order: &Order) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.orders.push(order.clone());
        Ok(())
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Value>, RepositoryError> {
        let documents = {
            let users = self.users.read().await;
            users
                .values()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?
        };
        Ok(pipeline.run(documents)?)
    }
}
