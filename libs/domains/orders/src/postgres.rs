use async_trait::async_trait;
use chrono::Utc;
use database::txn::{serializable, TxnError};
use domain_cart::entity as cart;
use domain_catalog::entity::product;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ExprTrait, QueryFilter, QueryOrder,
};

use crate::entity::{order, order_item};
use crate::error::{OrderError, OrderResult};
use crate::models::{Order, OrderStatus};
use crate::repository::OrderRepository;

/// PostgreSQL implementation of [`OrderRepository`].
///
/// `place_order` runs as one serializable transaction: stock validation,
/// the conditional decrements, the order and item inserts, and the cart
/// cleanup commit together. The decrement itself is guarded with
/// `stock >= quantity` so even a racing transaction that slipped past the
/// read cannot take stock below zero.
pub struct PgOrderRepository {
    db: DatabaseConnection,
}

impl PgOrderRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<Vec<order_item::Model>, DbErr> {
    order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn place_order(&self, user_id: i32) -> OrderResult<Order> {
        let (placed, items) = serializable(&self.db, move |txn| {
            Box::pin(async move {
                let cart_rows = cart::Entity::find()
                    .filter(cart::Column::UserId.eq(user_id))
                    .order_by_asc(cart::Column::ProductId)
                    .all(txn)
                    .await?;
                if cart_rows.is_empty() {
                    return Err(TxnError::Abort(OrderError::EmptyCart));
                }

                // Validate every line before mutating anything
                let mut lines = Vec::with_capacity(cart_rows.len());
                for row in &cart_rows {
                    let Some(product) = product::Entity::find_by_id(row.product_id)
                        .filter(product::Column::IsActive.eq(true))
                        .one(txn)
                        .await?
                    else {
                        return Err(TxnError::Abort(OrderError::ProductNotFound(
                            row.product_id,
                        )));
                    };
                    if row.quantity > product.stock {
                        return Err(TxnError::Abort(OrderError::InsufficientStock {
                            product_id: row.product_id,
                            available: product.stock,
                            requested: row.quantity,
                        }));
                    }
                    lines.push((row.product_id, row.quantity, product.price));
                }

                // Conditional decrement; zero rows affected means another
                // transaction took the stock first
                for (product_id, quantity, _) in &lines {
                    let result = product::Entity::update_many()
                        .col_expr(
                            product::Column::Stock,
                            Expr::col(product::Column::Stock).sub(*quantity),
                        )
                        .filter(product::Column::Id.eq(*product_id))
                        .filter(product::Column::Stock.gte(*quantity))
                        .exec(txn)
                        .await?;
                    if result.rows_affected == 0 {
                        let available = product::Entity::find_by_id(*product_id)
                            .one(txn)
                            .await?
                            .map(|p| p.stock)
                            .unwrap_or(0);
                        return Err(TxnError::Abort(OrderError::InsufficientStock {
                            product_id: *product_id,
                            available,
                            requested: *quantity,
                        }));
                    }
                }

                let total_amount: i64 = lines.iter().map(|(_, q, p)| *q as i64 * *p).sum();
                let now = Utc::now();
                let placed = order::ActiveModel {
                    user_id: Set(user_id),
                    status: Set(OrderStatus::Pending),
                    total_amount: Set(total_amount),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                for (product_id, quantity, unit_price) in &lines {
                    order_item::ActiveModel {
                        order_id: Set(placed.id),
                        product_id: Set(*product_id),
                        quantity: Set(*quantity),
                        unit_price: Set(*unit_price),
                        total_price: Set(*quantity as i64 * *unit_price),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                }

                cart::Entity::delete_many()
                    .filter(cart::Column::UserId.eq(user_id))
                    .exec(txn)
                    .await?;

                let items = load_items(txn, placed.id).await?;
                Ok((placed, items))
            })
        })
        .await
        .map_err(OrderError::from)?;

        tracing::info!(
            order_id = placed.id,
            user_id,
            total_amount = placed.total_amount,
            "Placed order"
        );
        Ok(Order::from_entities(placed, items))
    }

    async fn transition(&self, order_id: i32, next: OrderStatus) -> OrderResult<Order> {
        let (updated, items) = serializable(&self.db, move |txn| {
            Box::pin(async move {
                let Some(model) = order::Entity::find_by_id(order_id).one(txn).await? else {
                    return Err(TxnError::Abort(OrderError::OrderNotFound(order_id)));
                };

                if !model.status.can_transition_to(next) {
                    return Err(TxnError::Abort(OrderError::InvalidTransition {
                        from: model.status,
                        to: next,
                    }));
                }

                let mut active: order::ActiveModel = model.into();
                active.status = Set(next);
                active.updated_at = Set(Utc::now().into());
                let updated = active.update(txn).await?;

                let items = load_items(txn, order_id).await?;
                Ok((updated, items))
            })
        })
        .await
        .map_err(OrderError::from)?;

        tracing::info!(order_id, status = %next, "Order status changed");
        Ok(Order::from_entities(updated, items))
    }

    async fn cancel_order(&self, order_id: i32) -> OrderResult<Order> {
        let (cancelled, items) = serializable(&self.db, move |txn| {
            Box::pin(async move {
                let Some(model) = order::Entity::find_by_id(order_id).one(txn).await? else {
                    return Err(TxnError::Abort(OrderError::OrderNotFound(order_id)));
                };

                if !model.status.can_transition_to(OrderStatus::Cancelled) {
                    return Err(TxnError::Abort(OrderError::InvalidTransition {
                        from: model.status,
                        to: OrderStatus::Cancelled,
                    }));
                }

                // Give back exactly what placement took
                let items = load_items(txn, order_id).await?;
                for item in &items {
                    product::Entity::update_many()
                        .col_expr(
                            product::Column::Stock,
                            Expr::col(product::Column::Stock).add(item.quantity),
                        )
                        .filter(product::Column::Id.eq(item.product_id))
                        .exec(txn)
                        .await?;
                }

                let mut active: order::ActiveModel = model.into();
                active.status = Set(OrderStatus::Cancelled);
                active.updated_at = Set(Utc::now().into());
                let cancelled = active.update(txn).await?;

                Ok((cancelled, items))
            })
        })
        .await
        .map_err(OrderError::from)?;

        tracing::info!(order_id, "Order cancelled, stock restored");
        Ok(Order::from_entities(cancelled, items))
    }

    async fn get_order(&self, order_id: i32) -> OrderResult<Option<Order>> {
        let Some(model) = order::Entity::find_by_id(order_id).one(&self.db).await? else {
            return Ok(None);
        };
        let items = load_items(&self.db, order_id).await?;
        Ok(Some(Order::from_entities(model, items)))
    }

    async fn list_orders(&self, user_id: i32) -> OrderResult<Vec<Order>> {
        let rows = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_asc(order::Column::Id)
            .find_with_related(order_item::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(model, items)| Order::from_entities(model, items))
            .collect())
    }
}
