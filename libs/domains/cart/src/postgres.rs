use async_trait::async_trait;
use chrono::Utc;
use database::txn::{serializable, TxnError};
use domain_catalog::entity::product;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder,
};

use crate::entity;
use crate::error::{CartError, CartResult};
use crate::models::{CartItem, CartLine, CartView};
use crate::repository::CartRepository;

/// PostgreSQL implementation of [`CartRepository`].
///
/// Upserts run as serializable transactions; the UNIQUE(user_id, product_id)
/// constraint backstops the find-or-insert against racing requests.
pub struct PgCartRepository {
    db: DatabaseConnection,
}

impl PgCartRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn find_row<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    product_id: i32,
) -> Result<Option<entity::Model>, DbErr> {
    entity::Entity::find()
        .filter(entity::Column::UserId.eq(user_id))
        .filter(entity::Column::ProductId.eq(product_id))
        .one(conn)
        .await
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn add_or_update(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> CartResult<CartItem> {
        let model = serializable(&self.db, move |txn| {
            Box::pin(async move {
                let active_product = product::Entity::find_by_id(product_id)
                    .filter(product::Column::IsActive.eq(true))
                    .one(txn)
                    .await?;
                if active_product.is_none() {
                    return Err(TxnError::Abort(CartError::ProductNotFound(product_id)));
                }

                let model = match find_row(txn, user_id, product_id).await? {
                    Some(row) => {
                        let new_quantity = row.quantity + quantity;
                        let mut active: entity::ActiveModel = row.into();
                        active.quantity = Set(new_quantity);
                        active.updated_at = Set(Utc::now().into());
                        active.update(txn).await?
                    }
                    None => {
                        let now = Utc::now();
                        let active = entity::ActiveModel {
                            user_id: Set(user_id),
                            product_id: Set(product_id),
                            quantity: Set(quantity),
                            created_at: Set(now.into()),
                            updated_at: Set(now.into()),
                            ..Default::default()
                        };
                        active.insert(txn).await?
                    }
                };
                Ok(model)
            })
        })
        .await
        .map_err(CartError::from)?;

        tracing::info!(user_id, product_id, quantity = model.quantity, "Cart row upserted");
        Ok(model.into())
    }

    async fn set_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> CartResult<CartItem> {
        let model = serializable(&self.db, move |txn| {
            Box::pin(async move {
                let Some(row) = find_row(txn, user_id, product_id).await? else {
                    return Err(TxnError::Abort(CartError::ItemNotFound(product_id)));
                };

                let mut active: entity::ActiveModel = row.into();
                active.quantity = Set(quantity);
                active.updated_at = Set(Utc::now().into());
                Ok(active.update(txn).await?)
            })
        })
        .await
        .map_err(CartError::from)?;

        tracing::info!(user_id, product_id, quantity, "Cart quantity replaced");
        Ok(model.into())
    }

    async fn remove(&self, user_id: i32, product_id: i32) -> CartResult<()> {
        let Some(row) = find_row(&self.db, user_id, product_id).await? else {
            return Err(CartError::ItemNotFound(product_id));
        };

        row.delete(&self.db).await?;

        tracing::info!(user_id, product_id, "Cart row removed");
        Ok(())
    }

    async fn view(&self, user_id: i32) -> CartResult<CartView> {
        let rows = entity::Entity::find()
            .filter(entity::Column::UserId.eq(user_id))
            .order_by_asc(entity::Column::Id)
            .find_also_related(product::Entity)
            .all(&self.db)
            .await?;

        let items: Vec<CartLine> = rows
            .into_iter()
            .filter_map(|(row, product)| {
                let product = product?;
                Some(CartLine {
                    product_id: row.product_id,
                    name: product.name,
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
