use async_trait::async_trait;
use database::txn::{serializable, TxnError};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Statement,
};

use crate::entity::{category, product};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Category, CreateCategory, CreateProduct, Product};
use crate::repository::CatalogRepository;

/// PostgreSQL implementation of [`CatalogRepository`].
///
/// Writes run as serializable transactions so the referential checks
/// (active category, cycle guard, delete protection) cannot race with the
/// writes they guard. Search is delegated to the generated `tsv` column.
pub struct PgCatalogRepository {
    db: DatabaseConnection,
}

impl PgCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn find_active_category<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<category::Model>, DbErr> {
    category::Entity::find_by_id(id)
        .filter(category::Column::IsActive.eq(true))
        .one(conn)
        .await
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

/// Walk the ancestor chain starting at `parent_id`; true if it reaches `id`.
async fn would_create_cycle<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    mut parent_id: Option<i32>,
) -> Result<bool, DbErr> {
    while let Some(pid) = parent_id {
        if pid == id {
            return Ok(true);
        }
        parent_id = category::Entity::find_by_id(pid)
            .one(conn)
            .await?
            .and_then(|c| c.parent_id);
    }
    Ok(false)
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn create_category(&self, input: CreateCategory) -> CatalogResult<Category> {
        let model = serializable(&self.db, move |txn| {
            let input = input.clone();
            Box::pin(async move {
                if let Some(pid) = input.parent_id {
                    if find_active_category(txn, pid).await?.is_none() {
                        return Err(TxnError::Abort(CatalogError::InvalidCategory(pid)));
                    }
                }

                let active = category::ActiveModel {
                    name: Set(input.name),
                    parent_id: Set(input.parent_id),
                    is_active: Set(true),
                    ..Default::default()
                };
                Ok(active.insert(txn).await?)
            })
        })
        .await
        .map_err(CatalogError::from)?;

        tracing::info!(category_id = model.id, "Created category");
        Ok(model.into())
    }

    async fn update_category(&self, id: i32, input: CreateCategory) -> CatalogResult<Category> {
        let model = serializable(&self.db, move |txn| {
            let input = input.clone();
            Box::pin(async move {
                let Some(model) = find_active_category(txn, id).await? else {
                    return Err(TxnError::Abort(CatalogError::CategoryNotFound(id)));
                };

                if let Some(pid) = input.parent_id {
                    if find_active_category(txn, pid).await?.is_none() {
                        return Err(TxnError::Abort(CatalogError::InvalidCategory(pid)));
                    }
                    if would_create_cycle(txn, id, input.parent_id).await? {
                        return Err(TxnError::Abort(CatalogError::InvalidCategory(pid)));
                    }
                }

                let mut active: category::ActiveModel = model.into();
                active.name = Set(input.name);
                active.parent_id = Set(input.parent_id);
                Ok(active.update(txn).await?)
            })
        })
        .await
        .map_err(CatalogError::from)?;

        tracing::info!(category_id = id, "Updated category");
        Ok(model.into())
    }

    async fn delete_category(&self, id: i32) -> CatalogResult<()> {
        serializable(&self.db, move |txn| {
            Box::pin(async move {
                let Some(model) = find_active_category(txn, id).await? else {
                    return Err(TxnError::Abort(CatalogError::CategoryNotFound(id)));
                };

                let active_products = product::Entity::find()
                    .filter(product::Column::CategoryId.eq(id))
                    .filter(product::Column::IsActive.eq(true))
                    .count(txn)
                    .await?;
                if active_products > 0 {
                    return Err(TxnError::Abort(CatalogError::CategoryInUse(id)));
                }

                let mut active: category::ActiveModel = model.into();
                active.is_active = Set(false);
                active.update(txn).await?;
                Ok(())
            })
        })
        .await
        .map_err(CatalogError::from)?;

        tracing::info!(category_id = id, "Deactivated category");
        Ok(())
    }

    async fn get_category(&self, id: i32) -> CatalogResult<Option<Category>> {
        let model = find_active_category(&self.db, id).await?;
        Ok(model.map(Into::into))
    }

    async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let models = category::Entity::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn create_product(
        &self,
        seller_id: i32,
        input: CreateProduct,
    ) -> CatalogResult<Product> {
        let model = serializable(&self.db, move |txn| {
            let input = input.clone();
            Box::pin(async move {
                if find_active_category(txn, input.category_id).await?.is_none() {
                    return Err(TxnError::Abort(CatalogError::InvalidCategory(
                        input.category_id,
                    )));
                }

                let active = product::ActiveModel {
                    name: Set(input.name),
                    description: Set(input.description),
                    price: Set(input.price),
                    image_url: Set(input.image_url),
                    stock: Set(input.stock),
                    is_active: Set(true),
                    category_id: Set(input.category_id),
                    seller_id: Set(seller_id),
                    rating: Set(0.0),
                    ..Default::default()
                };
                Ok(active.insert(txn).await?)
            })
        })
        .await
        .map_err(CatalogError::from)?;

        tracing::info!(product_id = model.id, "Created product");
        Ok(model.into())
    }

    async fn update_product(&self, id: i32, input: CreateProduct) -> CatalogResult<Product> {
        let model = serializable(&self.db, move |txn| {
            let input = input.clone();
            Box::pin(async move {
                let Some(model) = find_active_product(txn, id).await? else {
                    return Err(TxnError::Abort(CatalogError::ProductNotFound(id)));
                };

                if find_active_category(txn, input.category_id).await?.is_none() {
                    return Err(TxnError::Abort(CatalogError::InvalidCategory(
                        input.category_id,
                    )));
                }

                // rating and the tsv column stay untouched: one is owned by
                // the reviews domain, the other by the database
                let mut active: product::ActiveModel = model.into();
                active.name = Set(input.name);
                active.description = Set(input.description);
                active.price = Set(input.price);
                active.image_url = Set(input.image_url);
                active.stock = Set(input.stock);
                active.category_id = Set(input.category_id);
                Ok(active.update(txn).await?)
            })
        })
        .await
        .map_err(CatalogError::from)?;

        tracing::info!(product_id = id, "Updated product");
        Ok(model.into())
    }

    async fn delete_product(&self, id: i32) -> CatalogResult<()> {
        serializable(&self.db, move |txn| {
            Box::pin(async move {
                let Some(model) = find_active_product(txn, id).await? else {
                    return Err(TxnError::Abort(CatalogError::ProductNotFound(id)));
                };

                let mut active: product::ActiveModel = model.into();
                active.is_active = Set(false);
                active.update(txn).await?;
                Ok(())
            })
        })
        .await
        .map_err(CatalogError::from)?;

        tracing::info!(product_id = id, "Deactivated product");
        Ok(())
    }

    async fn get_product(&self, id: i32) -> CatalogResult<Option<Product>> {
        let model = find_active_product(&self.db, id).await?;
        Ok(model.map(Into::into))
    }

    async fn list_products(&self) -> CatalogResult<Vec<Product>> {
        let models = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_products_by_category(&self, category_id: i32) -> CatalogResult<Vec<Product>> {
        if find_active_category(&self.db, category_id).await?.is_none() {
            return Err(CatalogError::CategoryNotFound(category_id));
        }

        let models = product::Entity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .filter(product::Column::IsActive.eq(true))
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn search(&self, query: &str, limit: u64) -> CatalogResult<Vec<Product>> {
        // Ranked match against the generated tsv column; ties break by id so
        // result order is deterministic
        let models = product::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                SELECT id, name, description, price, image_url, stock,
                       is_active, category_id, seller_id, rating
                FROM products
                WHERE is_active AND tsv @@ plainto_tsquery('english', $1)
                ORDER BY ts_rank(tsv, plainto_tsquery('english', $1)) DESC, id ASC
                LIMIT $2
                "#,
                [query.into(), (limit as i64).into()],
            ))
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
