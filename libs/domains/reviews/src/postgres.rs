use async_trait::async_trait;
use chrono::Utc;
use database::txn::{serializable, TxnError};
use domain_catalog::entity::product;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Statement,
};

use crate::entity;
use crate::error::{ReviewError, ReviewResult};
use crate::models::{CreateReview, Review};
use crate::repository::ReviewRepository;

/// PostgreSQL implementation of [`ReviewRepository`].
///
/// The review write and the rating recomputation share one serializable
/// transaction; a crash between them rolls both back.
pub struct PgReviewRepository {
    db: DatabaseConnection,
}

impl PgReviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn find_active_product<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<product::Model>, DbErr> {
    product::Entity::find_by_id(id)
        .filter(product::Column::IsActive.eq(true))
        .one(conn)
        .await
}

/// Write `rating = mean(grade) over active reviews` (0.0 when none) into the
/// product row, inside the caller's transaction.
async fn recompute_rating<C: ConnectionTrait>(conn: &C, product_id: i32) -> Result<(), DbErr> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"
        SELECT COALESCE(AVG(grade), 0)::float8 AS rating
        FROM reviews
        WHERE product_id = $1 AND is_active
        "#,
        [product_id.into()],
    );
    let rating: f64 = conn
        .query_one_raw(stmt)
        .await?
        .map(|row| row.try_get("", "rating"))
        .transpose()?
        .unwrap_or(0.0);

    product::Entity::update_many()
        .col_expr(product::Column::Rating, Expr::value(rating))
        .filter(product::Column::Id.eq(product_id))
        .exec(conn)
        .await?;

    Ok(())
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn add_review(&self, user_id: i32, input: CreateReview) -> ReviewResult<Review> {
        let model = serializable(&self.db, move |txn| {
            let input = input.clone();
            Box::pin(async move {
                if find_active_product(txn, input.product_id).await?.is_none() {
                    return Err(TxnError::Abort(ReviewError::ProductNotFound(
                        input.product_id,
                    )));
                }

                let existing = entity::Entity::find()
                    .filter(entity::Column::UserId.eq(user_id))
                    .filter(entity::Column::ProductId.eq(input.product_id))
                    .filter(entity::Column::IsActive.eq(true))
                    .one(txn)
                    .await?;
                if existing.is_some() {
                    return Err(TxnError::Abort(ReviewError::Duplicate));
                }

                let active = entity::ActiveModel {
                    user_id: Set(user_id),
                    product_id: Set(input.product_id),
                    comment: Set(input.comment),
                    comment_date: Set(Utc::now().into()),
                    grade: Set(input.grade),
                    is_active: Set(true),
                    ..Default::default()
                };
                let model = active.insert(txn).await?;

                recompute_rating(txn, model.product_id).await?;
                Ok(model)
            })
        })
        .await
        .map_err(ReviewError::from)?;

        tracing::info!(
            review_id = model.id,
            product_id = model.product_id,
            "Added review"
        );
        Ok(model.into())
    }

    async fn remove_review(&self, review_id: i32) -> ReviewResult<()> {
        let product_id = serializable(&self.db, move |txn| {
            Box::pin(async move {
                let Some(model) = entity::Entity::find_by_id(review_id)
                    .filter(entity::Column::IsActive.eq(true))
                    .one(txn)
                    .await?
                else {
                    return Err(TxnError::Abort(ReviewError::ReviewNotFound(review_id)));
                };

                let product_id = model.product_id;
                let mut active: entity::ActiveModel = model.into();
                active.is_active = Set(false);
                active.update(txn).await?;

                recompute_rating(txn, product_id).await?;
                Ok(product_id)
            })
        })
        .await
        .map_err(ReviewError::from)?;

        tracing::info!(review_id, product_id, "Removed review");
        Ok(())
    }

    async fn list_reviews(&self) -> ReviewResult<Vec<Review>> {
        let models = entity::Entity::find()
            .filter(entity::Column::IsActive.eq(true))
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_product_reviews(&self, product_id: i32) -> ReviewResult<Vec<Review>> {
        if find_active_product(&self.db, product_id).await?.is_none() {
            return Err(ReviewError::ProductNotFound(product_id));
        }

        let models = entity::Entity::find()
            .filter(entity::Column::ProductId.eq(product_id))
            .filter(entity::Column::IsActive.eq(true))
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
