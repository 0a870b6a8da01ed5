use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{OrderError, OrderResult};
use crate::models::{Order, OrderItem, OrderStatus};

/// Repository trait for order persistence.
///
/// `place_order` and `cancel_order` are single atomic operations: the stock
/// checks, the stock mutation, the order rows, and the cart cleanup all
/// commit together or not at all. Partial orders can never exist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Convert the user's cart into a pending order, decrementing stock and
    /// snapshotting unit prices
    async fn place_order(&self, user_id: i32) -> OrderResult<Order>;

    /// Apply a status transition validated by the state machine
    async fn transition(&self, order_id: i32, next: OrderStatus) -> OrderResult<Order>;

    /// Cancel a pending or paid order, restoring each item's stock
    async fn cancel_order(&self, order_id: i32) -> OrderResult<Order>;

    /// Fetch an order with its items
    async fn get_order(&self, order_id: i32) -> OrderResult<Option<Order>>;

    /// The user's orders, oldest first
    async fn list_orders(&self, user_id: i32) -> OrderResult<Vec<Order>>;
}

#[derive(Clone, Copy)]
struct ProductRow {
    price: i64,
    stock: i32,
    is_active: bool,
}

#[derive(Clone, Copy)]
struct CartRow {
    user_id: i32,
    product_id: i32,
    quantity: i32,
}

#[derive(Default)]
struct Inner {
    products: HashMap<i32, ProductRow>,
    cart: Vec<CartRow>,
    orders: HashMap<i32, Order>,
    next_order_id: i32,
    next_item_id: i32,
}

/// In-memory implementation of [`OrderRepository`] (for development and
/// tests). It owns its own product and cart rows, seeded by the caller; all
/// check-and-act sequences run under one write lock, which is what makes
/// the concurrency properties hold.
#[derive(Default, Clone)]
pub struct InMemoryOrderRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active product orders can be placed against
    pub async fn seed_product(&self, product_id: i32, price: i64, stock: i32) {
        let mut inner = self.inner.write().await;
        inner.products.insert(
            product_id,
            ProductRow {
                price,
                stock,
                is_active: true,
            },
        );
    }

    /// Put units of a product into a user's cart
    pub async fn seed_cart_item(&self, user_id: i32, product_id: i32, quantity: i32) {
        let mut inner = self.inner.write().await;
        inner.cart.push(CartRow {
            user_id,
            product_id,
            quantity,
        });
    }

    /// Mark a seeded product inactive
    pub async fn deactivate_product(&self, product_id: i32) {
        let mut inner = self.inner.write().await;
        if let Some(product) = inner.products.get_mut(&product_id) {
            product.is_active = false;
        }
    }

    /// Change a seeded product's live price (snapshots must not move)
    pub async fn reprice_product(&self, product_id: i32, price: i64) {
        let mut inner = self.inner.write().await;
        if let Some(product) = inner.products.get_mut(&product_id) {
            product.price = price;
        }
    }

    /// Current stock of a seeded product
    pub async fn product_stock(&self, product_id: i32) -> Option<i32> {
        let inner = self.inner.read().await;
        inner.products.get(&product_id).map(|p| p.stock)
    }

    /// Remaining cart rows for a user
    pub async fn cart_len(&self, user_id: i32) -> usize {
        let inner = self.inner.read().await;
        inner.cart.iter().filter(|r| r.user_id == user_id).count()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn place_order(&self, user_id: i32) -> OrderResult<Order> {
        let mut inner = self.inner.write().await;

        let mut lines: Vec<CartRow> = inner
            .cart
            .iter()
            .filter(|r| r.user_id == user_id)
            .copied()
            .collect();
        lines.sort_by_key(|r| r.product_id);

        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        // Validate every line before touching anything
        let mut priced: Vec<(CartRow, i64)> = Vec::with_capacity(lines.len());
        for line in lines {
            let product = inner
                .products
                .get(&line.product_id)
                .filter(|p| p.is_active)
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            if line.quantity > product.stock {
                return Err(OrderError::InsufficientStock {
                    product_id: line.product_id,
                    available: product.stock,
                    requested: line.quantity,
                });
            }
            priced.push((line, product.price));
        }

        // All checks passed; mutate as one unit
        inner.next_order_id += 1;
        let order_id = inner.next_order_id;
        let now = Utc::now();

        let mut items = Vec::with_capacity(priced.len());
        for (line, unit_price) in priced {
            inner
                .products
                .get_mut(&line.product_id)
                .unwrap()
                .stock -= line.quantity;

            inner.next_item_id += 1;
            items.push(OrderItem {
                id: inner.next_item_id,
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
                total_price: line.quantity as i64 * unit_price,
            });
        }

        let total_amount: i64 = items.iter().map(|i| i.total_price).sum();
        let order = Order {
            id: order_id,
            user_id,
            status: OrderStatus::Pending,
            total_amount,
            display_total: total_amount as f64 / 100.0,
            created_at: now,
            updated_at: now,
            items,
        };

        inner.cart.retain(|r| r.user_id != user_id);
        inner.orders.insert(order_id, order.clone());

        tracing::info!(order_id, user_id, total_amount, "Placed order");
        Ok(order)
    }

    async fn transition(&self, order_id: i32, next: OrderStatus) -> OrderResult<Order> {
        let mut inner = self.inner.write().await;

        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        order.status = next;
        order.updated_at = Utc::now();
        let updated = order.clone();

        tracing::info!(order_id, status = %next, "Order status changed");
        Ok(updated)
    }

    async fn cancel_order(&self, order_id: i32) -> OrderResult<Order> {
        let mut inner = self.inner.write().await;

        let order = inner
            .orders
            .get(&order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        // Give back exactly what placement took
        let restores: Vec<(i32, i32)> = order
            .items
            .iter()
            .map(|i| (i.product_id, i.quantity))
            .collect();
        for (product_id, quantity) in restores {
            if let Some(product) = inner.products.get_mut(&product_id) {
                product.stock += quantity;
            }
        }

        let order = inner.orders.get_mut(&order_id).unwrap();
        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();
        let cancelled = order.clone();

        tracing::info!(order_id, "Order cancelled, stock restored");
        Ok(cancelled)
    }

    async fn get_order(&self, order_id: i32) -> OrderResult<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&order_id).cloned())
    }

    async fn list_orders(&self, user_id: i32) -> OrderResult<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_place_order_decrements_stock_and_clears_cart() {
        let repo = InMemoryOrderRepository::new();
        repo.seed_product(1, 1000, 5).await;
        repo.seed_product(2, 2500, 3).await;
        repo.seed_cart_item(7, 1, 2).await;
        repo.seed_cart_item(7, 2, 1).await;

        let order = repo.place_order(7).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, 2 * 1000 + 2500);
        assert_eq!(order.items.len(), 2);
        assert_eq!(repo.product_stock(1).await, Some(3));
        assert_eq!(repo.product_stock(2).await, Some(2));
        assert_eq!(repo.cart_len(7).await, 0);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let repo = InMemoryOrderRepository::new();
        let result = repo.place_order(7).await;
        assert!(matches!(result, Err(OrderError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_one_short_line_fails_the_whole_order() {
        let repo = InMemoryOrderRepository::new();
        repo.seed_product(1, 1000, 5).await;
        repo.seed_product(2, 2000, 0).await;
        repo.seed_cart_item(7, 1, 2).await;
        repo.seed_cart_item(7, 2, 1).await;

        let result = repo.place_order(7).await;
        assert!(matches!(
            result,
            Err(OrderError::InsufficientStock {
                product_id: 2,
                available: 0,
                requested: 1,
            })
        ));

        // No partial decrement, cart untouched
        assert_eq!(repo.product_stock(1).await, Some(5));
        assert_eq!(repo.product_stock(2).await, Some(0));
        assert_eq!(repo.cart_len(7).await, 2);
    }

    #[tokio::test]
    async fn test_inactive_product_in_cart_fails_the_order() {
        let repo = InMemoryOrderRepository::new();
        repo.seed_product(1, 1000, 5).await;
        repo.seed_product(2, 2000, 5).await;
        repo.seed_cart_item(7, 1, 1).await;
        repo.seed_cart_item(7, 2, 1).await;
        repo.deactivate_product(2).await;

        let result = repo.place_order(7).await;
        assert!(matches!(result, Err(OrderError::ProductNotFound(2))));
        assert_eq!(repo.product_stock(1).await, Some(5));
    }

    #[tokio::test]
    async fn test_totals_are_frozen_against_later_price_changes() {
        let repo = InMemoryOrderRepository::new();
        repo.seed_product(1, 1000, 5).await;
        repo.seed_cart_item(7, 1, 2).await;

        let order = repo.place_order(7).await.unwrap();
        assert_eq!(order.total_amount, 2000);
        assert_eq!(order.items[0].unit_price, 1000);

        repo.reprice_product(1, 9999).await;

        let reread = repo.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reread.total_amount, 2000);
        assert_eq!(reread.items[0].unit_price, 1000);
        assert_eq!(
            reread.total_amount,
            reread.items.iter().map(|i| i.total_price).sum::<i64>()
        );
    }

    #[tokio::test]
    async fn test_cancel_restores_exactly_the_decremented_quantities() {
        let repo = InMemoryOrderRepository::new();
        repo.seed_product(1, 1000, 5).await;
        repo.seed_product(2, 2500, 3).await;
        repo.seed_cart_item(7, 1, 4).await;
        repo.seed_cart_item(7, 2, 3).await;

        let order = repo.place_order(7).await.unwrap();
        assert_eq!(repo.product_stock(1).await, Some(1));
        assert_eq!(repo.product_stock(2).await, Some(0));

        // Cancelling a paid order restores stock too
        repo.transition(order.id, OrderStatus::Paid).await.unwrap();
        let cancelled = repo.cancel_order(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(repo.product_stock(1).await, Some(5));
        assert_eq!(repo.product_stock(2).await, Some(3));
    }

    #[tokio::test]
    async fn test_cancel_is_rejected_after_shipping_or_cancelling() {
        let repo = InMemoryOrderRepository::new();
        repo.seed_product(1, 1000, 5).await;
        repo.seed_cart_item(7, 1, 1).await;

        let order = repo.place_order(7).await.unwrap();
        repo.transition(order.id, OrderStatus::Paid).await.unwrap();
        repo.transition(order.id, OrderStatus::Shipped).await.unwrap();

        let result = repo.cancel_order(order.id).await;
        assert!(matches!(
            result,
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled,
            })
        ));
        // Stock must not be restored by a rejected cancel
        assert_eq!(repo.product_stock(1).await, Some(4));
    }

    #[tokio::test]
    async fn test_double_cancel_does_not_restore_twice() {
        let repo = InMemoryOrderRepository::new();
        repo.seed_product(1, 1000, 5).await;
        repo.seed_cart_item(7, 1, 2).await;

        let order = repo.place_order(7).await.unwrap();
        repo.cancel_order(order.id).await.unwrap();
        assert_eq!(repo.product_stock(1).await, Some(5));

        let result = repo.cancel_order(order.id).await;
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
        assert_eq!(repo.product_stock(1).await, Some(5));
    }

    #[tokio::test]
    async fn test_skipping_paid_is_an_invalid_transition() {
        let repo = InMemoryOrderRepository::new();
        repo.seed_product(1, 1000, 5).await;
        repo.seed_cart_item(7, 1, 1).await;

        let order = repo.place_order(7).await.unwrap();
        let result = repo.transition(order.id, OrderStatus::Shipped).await;
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_orders_never_oversell() {
        let repo = InMemoryOrderRepository::new();
        repo.seed_product(1, 1000, 5).await;
        for user_id in 0..10 {
            repo.seed_cart_item(user_id, 1, 1).await;
        }

        let handles: Vec<_> = (0..10)
            .map(|user_id| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.place_order(user_id).await })
            })
            .collect();

        let mut placed = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(OrderError::InsufficientStock { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        // The sum of decrements never exceeds the starting stock
        assert_eq!(placed, 5);
        assert_eq!(rejected, 5);
        assert_eq!(repo.product_stock(1).await, Some(0));
    }
}
