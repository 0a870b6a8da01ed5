use std::sync::Arc;

use crate::error::{OrderError, OrderResult};
use crate::models::{Order, OrderStatus};
use crate::repository::OrderRepository;

/// Service layer for order business logic: ownership checks and the
/// operator-facing transitions.
#[derive(Clone)]
pub struct OrderService<R: OrderRepository> {
    repository: Arc<R>,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Convert the user's cart into a pending order
    pub async fn place_order(&self, user_id: i32) -> OrderResult<Order> {
        self.repository.place_order(user_id).await
    }

    /// Mark a pending order paid
    pub async fn pay_order(&self, order_id: i32) -> OrderResult<Order> {
        self.repository.transition(order_id, OrderStatus::Paid).await
    }

    /// Mark a paid order shipped
    pub async fn ship_order(&self, order_id: i32) -> OrderResult<Order> {
        self.repository
            .transition(order_id, OrderStatus::Shipped)
            .await
    }

    /// Cancel an order on behalf of its owner or an admin, restoring stock
    pub async fn cancel_order(
        &self,
        order_id: i32,
        user_id: i32,
        is_admin: bool,
    ) -> OrderResult<Order> {
        let order = self.get_order(order_id).await?;
        if !is_admin && order.user_id != user_id {
            return Err(OrderError::Unauthorized(order_id));
        }

        self.repository.cancel_order(order_id).await
    }

    /// Fetch an order without an ownership check (admin paths)
    pub async fn get_order(&self, order_id: i32) -> OrderResult<Order> {
        self.repository
            .get_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// Fetch an order, verifying the caller may see it
    pub async fn get_order_for_user(
        &self,
        order_id: i32,
        user_id: i32,
        is_admin: bool,
    ) -> OrderResult<Order> {
        let order = self.get_order(order_id).await?;
        if !is_admin && order.user_id != user_id {
            return Err(OrderError::Unauthorized(order_id));
        }
        Ok(order)
    }

    /// The user's own orders
    pub async fn list_orders(&self, user_id: i32) -> OrderResult<Vec<Order>> {
        self.repository.list_orders(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockOrderRepository;
    use chrono::Utc;

    fn order(id: i32, user_id: i32) -> Order {
        let now = Utc::now();
        Order {
            id,
            user_id,
            status: OrderStatus::Pending,
            total_amount: 1000,
            display_total: 10.0,
            created_at: now,
            updated_at: now,
            items: vec![],
        }
    }

    #[tokio::test]
    async fn test_cancel_is_refused_for_other_users() {
        let mut mock = MockOrderRepository::new();
        mock.expect_get_order().returning(|id| Ok(Some(order(id, 7))));
        // cancel_order must never be reached

        let service = OrderService::new(mock);
        let result = service.cancel_order(1, 8, false).await;
        assert!(matches!(result, Err(OrderError::Unauthorized(1))));
    }

    #[tokio::test]
    async fn test_admin_may_cancel_any_order() {
        let mut mock = MockOrderRepository::new();
        mock.expect_get_order().returning(|id| Ok(Some(order(id, 7))));
        mock.expect_cancel_order().returning(|id| {
            let mut cancelled = order(id, 7);
            cancelled.status = OrderStatus::Cancelled;
            Ok(cancelled)
        });

        let service = OrderService::new(mock);
        let cancelled = service.cancel_order(1, 99, true).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_get_order_maps_missing_to_not_found() {
        let mut mock = MockOrderRepository::new();
        mock.expect_get_order().returning(|_| Ok(None));

        let service = OrderService::new(mock);
        let result = service.get_order(42).await;
        assert!(matches!(result, Err(OrderError::OrderNotFound(42))));
    }

    #[tokio::test]
    async fn test_owner_reads_own_order_but_not_others() {
        let mut mock = MockOrderRepository::new();
        mock.expect_get_order().returning(|id| Ok(Some(order(id, 7))));

        let service = OrderService::new(mock);
        assert!(service.get_order_for_user(1, 7, false).await.is_ok());
        assert!(matches!(
            service.get_order_for_user(1, 8, false).await,
            Err(OrderError::Unauthorized(1))
        ));
        assert!(service.get_order_for_user(1, 8, true).await.is_ok());
    }
}
