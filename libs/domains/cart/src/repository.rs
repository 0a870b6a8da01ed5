use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CartError, CartResult};
use crate::models::{CartItem, CartLine, CartView};

/// Repository trait for cart persistence.
///
/// The (user, product) uniqueness rule is enforced inside the
/// implementations (one lock in memory; a serializable transaction plus a
/// UNIQUE constraint in PostgreSQL) so concurrent upserts can never produce
/// two rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Add units of an active product; an existing row's quantity grows
    async fn add_or_update(&self, user_id: i32, product_id: i32, quantity: i32)
        -> CartResult<CartItem>;

    /// Replace an existing row's quantity
    async fn set_quantity(&self, user_id: i32, product_id: i32, quantity: i32)
        -> CartResult<CartItem>;

    /// Delete a cart row
    async fn remove(&self, user_id: i32, product_id: i32) -> CartResult<()>;

    /// The user's cart joined with live product data, plus presentation
    /// totals over current prices
    async fn view(&self, user_id: i32) -> CartResult<CartView>;
}

#[derive(Clone)]
struct ProductRow {
    name: String,
    price: i64,
    stock: i32,
    is_active: bool,
}

#[derive(Default)]
struct Inner {
    rows: HashMap<i32, CartItem>,
    products: HashMap<i32, ProductRow>,
    next_id: i32,
}

impl Inner {
    fn row_for(&self, user_id: i32, product_id: i32) -> Option<i32> {
        self.rows
            .values()
            .find(|r| r.user_id == user_id && r.product_id == product_id)
            .map(|r| r.id)
    }
}

/// In-memory implementation of [`CartRepository`] (for development and
/// tests), with its own minimal view of product rows seeded by the caller.
#[derive(Default, Clone)]
pub struct InMemoryCartRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active product that can be added to carts
    pub async fn seed_product(&self, product_id: i32, name: &str, price: i64, stock: i32) {
        let mut inner = self.inner.write().await;
        inner.products.insert(
            product_id,
            ProductRow {
                name: name.to_string(),
                price,
                stock,
                is_active: true,
            },
        );
    }

    /// Mark a seeded product inactive
    pub async fn deactivate_product(&self, product_id: i32) {
        let mut inner = self.inner.write().await;
        if let Some(product) = inner.products.get_mut(&product_id) {
            product.is_active = false;
        }
    }

    /// Change a seeded product's price (for testing the live-price totals)
    pub async fn reprice_product(&self, product_id: i32, price: i64) {
        let mut inner = self.inner.write().await;
        if let Some(product) = inner.products.get_mut(&product_id) {
            product.price = price;
        }
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn add_or_update(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> CartResult<CartItem> {
        let mut inner = self.inner.write().await;

        if !inner.products.get(&product_id).is_some_and(|p| p.is_active) {
            return Err(CartError::ProductNotFound(product_id));
        }

        let item = match inner.row_for(user_id, product_id) {
            Some(id) => {
                let row = inner.rows.get_mut(&id).unwrap();
                row.quantity += quantity;
                row.updated_at = Utc::now();
                row.clone()
            }
            None => {
                inner.next_id += 1;
                let now = Utc::now();
                let row = CartItem {
                    id: inner.next_id,
                    user_id,
                    product_id,
                    quantity,
                    created_at: now,
                    updated_at: now,
                };
                inner.rows.insert(row.id, row.clone());
                row
            }
        };

        tracing::info!(user_id, product_id, quantity = item.quantity, "Cart row upserted");
        Ok(item)
    }

    async fn set_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> CartResult<CartItem> {
        let mut inner = self.inner.write().await;

        let Some(id) = inner.row_for(user_id, product_id) else {
            return Err(CartError::ItemNotFound(product_id));
        };

        let row = inner.rows.get_mut(&id).unwrap();
        row.quantity = quantity;
        row.updated_at = Utc::now();
        let item = row.clone();

        tracing::info!(user_id, product_id, quantity, "Cart quantity replaced");
        Ok(item)
    }

    async fn remove(&self, user_id: i32, product_id: i32) -> CartResult<()> {
        let mut inner = self.inner.write().await;

        let Some(id) = inner.row_for(user_id, product_id) else {
            return Err(CartError::ItemNotFound(product_id));
        };
        inner.rows.remove(&id);

        tracing::info!(user_id, product_id, "Cart row removed");
        Ok(())
    }

    async fn view(&self, user_id: i32) -> CartResult<CartView> {
        let inner = self.inner.read().await;

        let mut rows: Vec<&CartItem> = inner
            .rows
            .values()
            .filter(|r| r.user_id == user_id)
            .collect();
        rows.sort_by_key(|r| r.id);

        let items: Vec<CartLine> = rows
            .into_iter()
            .filter_map(|row| {
                let product = inner.products.get(&row.product_id)?;
                Some(CartLine {
                    product_id: row.product_id,
                    name: product.name.clone(),
                    unit_price: product.price,
                    display_price: product.price as f64 / 100.0,
                    stock: product.stock,
                    quantity: row.quantity,
                    line_total: row.quantity as i64 * product.price,
                })
            })
            .collect();

        let total_quantity = items.iter().map(|l| l.quantity).sum();
        let total_price: i64 = items.iter().map(|l| l.line_total).sum();

        Ok(CartView {
            items,
            total_quantity,
            total_price,
            display_total_price: total_price as f64 / 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_repeated_adds_grow_one_row() {
        let repo = InMemoryCartRepository::new();
        repo.seed_product(1, "Keyboard", 1000, 10).await;

        repo.add_or_update(7, 1, 2).await.unwrap();
        let item = repo.add_or_update(7, 1, 3).await.unwrap();

        assert_eq!(item.quantity, 5);
        let view = repo.view(7).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.total_quantity, 5);
    }

    #[tokio::test]
    async fn test_concurrent_adds_never_duplicate_the_row() {
        let repo = InMemoryCartRepository::new();
        repo.seed_product(1, "Keyboard", 1000, 100).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.add_or_update(7, 1, 1).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let view = repo.view(7).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.total_quantity, 10);
    }

    #[tokio::test]
    async fn test_set_quantity_replaces_instead_of_adding() {
        let repo = InMemoryCartRepository::new();
        repo.seed_product(1, "Keyboard", 1000, 10).await;

        repo.add_or_update(7, 1, 2).await.unwrap();
        let item = repo.set_quantity(7, 1, 9).await.unwrap();
        assert_eq!(item.quantity, 9);

        let missing = repo.set_quantity(7, 2, 1).await;
        assert!(matches!(missing, Err(CartError::ItemNotFound(2))));
    }

    #[tokio::test]
    async fn test_inactive_product_cannot_be_added() {
        let repo = InMemoryCartRepository::new();
        repo.seed_product(1, "Keyboard", 1000, 10).await;
        repo.deactivate_product(1).await;

        let result = repo.add_or_update(7, 1, 1).await;
        assert!(matches!(result, Err(CartError::ProductNotFound(1))));
    }

    #[tokio::test]
    async fn test_remove_deletes_the_row() {
        let repo = InMemoryCartRepository::new();
        repo.seed_product(1, "Keyboard", 1000, 10).await;

        repo.add_or_update(7, 1, 2).await.unwrap();
        repo.remove(7, 1).await.unwrap();
        assert!(repo.view(7).await.unwrap().items.is_empty());

        let result = repo.remove(7, 1).await;
        assert!(matches!(result, Err(CartError::ItemNotFound(1))));
    }

    #[tokio::test]
    async fn test_view_totals_follow_current_prices() {
        let repo = InMemoryCartRepository::new();
        repo.seed_product(1, "Keyboard", 1000, 10).await;
        repo.seed_product(2, "Mouse", 2500, 4).await;

        repo.add_or_update(7, 1, 2).await.unwrap();
        repo.add_or_update(7, 2, 1).await.unwrap();

        let view = repo.view(7).await.unwrap();
        assert_eq!(view.total_quantity, 3);
        assert_eq!(view.total_price, 4500);
        assert_eq!(view.display_total_price, 45.0);

        // Totals are presentation aggregates over the live price
        repo.reprice_product(1, 2000).await;
        let view = repo.view(7).await.unwrap();
        assert_eq!(view.total_price, 6500);
    }

    #[tokio::test]
    async fn test_carts_are_isolated_per_user() {
        let repo = InMemoryCartRepository::new();
        repo.seed_product(1, "Keyboard", 1000, 10).await;

        repo.add_or_update(7, 1, 2).await.unwrap();
        repo.add_or_update(8, 1, 5).await.unwrap();

        assert_eq!(repo.view(7).await.unwrap().total_quantity, 2);
        assert_eq!(repo.view(8).await.unwrap().total_quantity, 5);
    }
}
