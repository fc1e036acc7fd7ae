//! Cart lifecycle service.
//!
//! Adds and removes cart items and turns carts (or single products) into
//! orders. All state lives in the user document; every write goes through
//! one of the store's atomic field-level updates.
//!
//! Identifiers arrive as raw request strings and are parsed before any store
//! call, so malformed input never reaches the database.

mod error;

pub use error::CartError;

use std::str::FromStr;

use chrono::Utc;
use tracing::{info, instrument};

use emporium_core::{IdError, ProductId, UserId};

use crate::db::{ProductStore, RepositoryError, UserStore};
use crate::models::{CartItem, Order, OrderDraft, Product};
use crate::services::deadline::{Deadline, Timeouts};

/// Parse a request identifier, naming the offending field on failure.
pub(crate) fn parse_id<T>(raw: &str, field: &'static str) -> Result<T, CartError>
where
    T: FromStr<Err = IdError>,
{
    raw.parse()
        .map_err(|source| CartError::InvalidInput { field, source })
}

/// Cart operations over a product and a user store.
pub struct CartService<'a> {
    products: &'a dyn ProductStore,
    users: &'a dyn UserStore,
    timeouts: Timeouts,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(
        products: &'a dyn ProductStore,
        users: &'a dyn UserStore,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            products,
            users,
            timeouts,
        }
    }

    /// Append one entry for `product_id` to the user's cart.
    ///
    /// Adding the same product twice appends two entries.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` for a missing or malformed ID,
    /// `CartError::ProductNotFound` / `CartError::UserNotFound` if either
    /// document is absent, and `CartError::Timeout` if the mutation budget
    /// runs out.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: &str, user_id: &str) -> Result<CartItem, CartError> {
        let product_id: ProductId = parse_id(product_id, "product id")?;
        let user_id: UserId = parse_id(user_id, "user id")?;
        let deadline = Deadline::after(self.timeouts.mutation, "add to cart");

        let product = self.product(&deadline, product_id).await?;
        let item = CartItem::from(&product);

        deadline
            .run(self.users.append_to_cart(user_id, &item))
            .await?
            .map_err(CartError::for_user)?;

        info!(%user_id, %product_id, price = %item.price, "Added item to cart");
        Ok(item)
    }

    /// Remove every cart entry for `product_id`.
    ///
    /// Removing a product that is not in the cart succeeds without changes.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` for a missing or malformed ID,
    /// `CartError::UserNotFound` if the user is absent, and
    /// `CartError::Timeout` if the mutation budget runs out.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: &str, user_id: &str) -> Result<(), CartError> {
        let product_id: ProductId = parse_id(product_id, "product id")?;
        let user_id: UserId = parse_id(user_id, "user id")?;
        let deadline = Deadline::after(self.timeouts.mutation, "remove item");

        deadline
            .run(self.users.remove_from_cart(user_id, product_id))
            .await?
            .map_err(CartError::for_user)?;

        info!(%user_id, %product_id, "Removed item from cart");
        Ok(())
    }

    /// Turn the user's cart into an order and empty the cart.
    ///
    /// An empty cart produces an order with no items and a zero total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` for a missing or malformed ID,
    /// `CartError::UserNotFound` if the user is absent, and
    /// `CartError::Timeout` if the checkout budget runs out.
    #[instrument(skip(self))]
    pub async fn buy_from_cart(&self, user_id: &str) -> Result<Order, CartError> {
        let user_id: UserId = parse_id(user_id, "user id")?;
        let deadline = Deadline::after(self.timeouts.checkout, "checkout");

        let draft = OrderDraft::new(Utc::now());
        let order = deadline
            .run(self.users.checkout_cart(user_id, &draft))
            .await?
            .map_err(CartError::for_user)?;

        info!(
            %user_id,
            order_id = %order.order_id,
            items = order.items.len(),
            total = %order.total,
            "Checked out cart"
        );
        Ok(order)
    }

    /// Order a single product directly, leaving the cart untouched.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` for a missing or malformed ID,
    /// `CartError::ProductNotFound` / `CartError::UserNotFound` if either
    /// document is absent, and `CartError::Timeout` if the mutation budget
    /// runs out.
    #[instrument(skip(self))]
    pub async fn instant_buy(&self, user_id: &str, product_id: &str) -> Result<Order, CartError> {
        let user_id: UserId = parse_id(user_id, "user id")?;
        let product_id: ProductId = parse_id(product_id, "product id")?;
        let deadline = Deadline::after(self.timeouts.mutation, "instant buy");

        let product = self.product(&deadline, product_id).await?;
        let order = OrderDraft::new(Utc::now())
            .into_order(vec![CartItem::from(&product)])
            .map_err(RepositoryError::from)?;

        deadline
            .run(self.users.append_order(user_id, &order))
            .await?
            .map_err(CartError::for_user)?;

        info!(
            %user_id,
            %product_id,
            order_id = %order.order_id,
            total = %order.total,
            "Placed instant order"
        );
        Ok(order)
    }

    async fn product(&self, deadline: &Deadline, id: ProductId) -> Result<Product, CartError> {
        deadline
            .run(self.products.find_by_id(id))
            .await??
            .ok_or(CartError::ProductNotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use emporium_core::Price;

    use super::*;
    use crate::db::{MemoryProductStore, MemoryUserStore, RepositoryError};
    use crate::models::User;

    struct Fixture {
        products: MemoryProductStore,
        users: MemoryUserStore,
        product: Product,
        user: User,
    }

    impl Fixture {
        async fn new() -> Self {
            let products = MemoryProductStore::new();
            let users = MemoryUserStore::new();
            let product = Product {
                id: ProductId::generate(),
                name: "Lamp".to_string(),
                price: Price::from_cents(1000).unwrap(),
                rating: Some(5),
                image: "lamp.png".to_string(),
            };
            products.insert(product.clone()).await.unwrap();

            let now = Utc::now();
            let user = User {
                id: UserId::generate(),
                first_name: "Alan".to_string(),
                last_name: "Turing".to_string(),
                password: "hash".to_string(),
                email: "alan@example.com".to_string(),
                phone: "555-0101".to_string(),
                token: "t".to_string(),
                refresh_token: "r".to_string(),
                token_expires_at: None,
                refresh_token_expires_at: None,
                created_at: now,
                updated_at: now,
                cart: Vec::new(),
                addresses: Vec::new(),
                orders: Vec::new(),
            };
            users.insert(&user).await.unwrap();

            Self {
                products,
                users,
                product,
                user,
            }
        }

        fn service(&self) -> CartService<'_> {
            CartService::new(&self.products, &self.users, Timeouts::default())
        }

        fn pid(&self) -> String {
            self.product.id.to_string()
        }

        fn uid(&self) -> String {
            self.user.id.to_string()
        }

        async fn stored_user(&self) -> User {
            self.users.find_by_id(self.user.id).await.unwrap().unwrap()
        }
    }

    #[tokio::test]
    async fn test_add_twice_appends_two_entries() {
        let f = Fixture::new().await;
        let service = f.service();

        service.add_to_cart(&f.pid(), &f.uid()).await.unwrap();
        service.add_to_cart(&f.pid(), &f.uid()).await.unwrap();

        let cart = f.stored_user().await.cart;
        assert_eq!(cart.len(), 2);
        assert!(cart.iter().all(|item| item.product_id == f.product.id));
        assert_eq!(cart[0].price, f.product.price);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_all_land() {
        const ADDS: usize = 32;
        let f = std::sync::Arc::new(Fixture::new().await);

        let tasks: Vec<_> = (0..ADDS)
            .map(|_| {
                let f = std::sync::Arc::clone(&f);
                tokio::spawn(async move { f.service().add_to_cart(&f.pid(), &f.uid()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(f.stored_user().await.cart.len(), ADDS);
    }

    #[tokio::test]
    async fn test_add_unknown_product_leaves_cart_untouched() {
        let f = Fixture::new().await;
        let missing = ProductId::generate().to_string();

        let result = f.service().add_to_cart(&missing, &f.uid()).await;

        assert!(matches!(result, Err(CartError::ProductNotFound)));
        assert!(f.stored_user().await.cart.is_empty());
    }

    #[tokio::test]
    async fn test_add_unknown_user_is_not_found() {
        let f = Fixture::new().await;
        let missing = UserId::generate().to_string();

        let result = f.service().add_to_cart(&f.pid(), &missing).await;
        assert!(matches!(result, Err(CartError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_empty_product_id_is_invalid_input() {
        let f = Fixture::new().await;

        let result = f.service().add_to_cart("", &f.uid()).await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(matches!(
            err,
            CartError::InvalidInput {
                field: "product id",
                source: IdError::Empty
            }
        ));
    }

    #[tokio::test]
    async fn test_malformed_user_id_is_invalid_input() {
        let f = Fixture::new().await;
        let result = f.service().buy_from_cart("not-an-id").await;
        assert!(matches!(
            result,
            Err(CartError::InvalidInput {
                source: IdError::Malformed(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_remove_missing_item_is_noop() {
        let f = Fixture::new().await;
        let service = f.service();
        service.add_to_cart(&f.pid(), &f.uid()).await.unwrap();
        let before = f.stored_user().await.cart;

        let other = ProductId::generate().to_string();
        service.remove_item(&other, &f.uid()).await.unwrap();

        assert_eq!(f.stored_user().await.cart, before);
    }

    #[tokio::test]
    async fn test_remove_unknown_user_is_not_found() {
        let f = Fixture::new().await;
        let missing = UserId::generate().to_string();
        let result = f.service().remove_item(&f.pid(), &missing).await;
        assert!(matches!(result, Err(CartError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_checkout_twice_second_order_is_empty() {
        let f = Fixture::new().await;
        let service = f.service();
        service.add_to_cart(&f.pid(), &f.uid()).await.unwrap();

        let first = service.buy_from_cart(&f.uid()).await.unwrap();
        let second = service.buy_from_cart(&f.uid()).await.unwrap();

        assert_eq!(first.total, Price::from_cents(1000).unwrap());
        assert_eq!(first.items.len(), 1);
        assert_eq!(second.total, Price::ZERO);
        assert!(second.items.is_empty());

        let user = f.stored_user().await;
        assert!(user.cart.is_empty());
        assert_eq!(user.orders.len(), 2);
    }

    #[tokio::test]
    async fn test_instant_buy_leaves_cart_alone() {
        let f = Fixture::new().await;
        let service = f.service();
        service.add_to_cart(&f.pid(), &f.uid()).await.unwrap();
        let cart_before = f.stored_user().await.cart;

        let order = service.instant_buy(&f.uid(), &f.pid()).await.unwrap();

        let user = f.stored_user().await;
        assert_eq!(user.cart, cart_before);
        assert_eq!(user.orders, vec![order.clone()]);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total, f.product.price);
    }

    #[tokio::test]
    async fn test_instant_buy_unknown_product_is_not_found() {
        let f = Fixture::new().await;
        let missing = ProductId::generate().to_string();
        let result = f.service().instant_buy(&f.uid(), &missing).await;
        assert!(matches!(result, Err(CartError::ProductNotFound)));
        assert!(f.stored_user().await.orders.is_empty());
    }

    struct StalledProducts;

    #[async_trait]
    impl ProductStore for StalledProducts {
        async fn find_by_id(&self, _id: ProductId) -> Result<Option<Product>, RepositoryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_times_out() {
        let f = Fixture::new().await;
        let timeouts = Timeouts {
            mutation: Duration::from_secs(5),
            checkout: Duration::from_secs(100),
        };
        let service = CartService::new(&StalledProducts, &f.users, timeouts);

        let result = service.add_to_cart(&f.pid(), &f.uid()).await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert!(f.stored_user().await.cart.is_empty());
    }
}
