use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Category, CreateCategory, CreateProduct, Product};
use crate::search::SearchDocument;

/// Repository trait for the catalog (categories + products).
///
/// Referential checks (active category, cycle guard, delete protection) live
/// inside the implementations so that check-and-act sequences stay atomic
/// with the write they guard.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Create a category; the parent, if given, must exist and be active
    async fn create_category(&self, input: CreateCategory) -> CatalogResult<Category>;

    /// Replace a category's name/parent
    async fn update_category(&self, id: i32, input: CreateCategory) -> CatalogResult<Category>;

    /// Soft-delete a category; rejected while active products reference it
    async fn delete_category(&self, id: i32) -> CatalogResult<()>;

    /// Get an active category by id
    async fn get_category(&self, id: i32) -> CatalogResult<Option<Category>>;

    /// List active categories
    async fn list_categories(&self) -> CatalogResult<Vec<Category>>;

    /// Create a product owned by `seller_id`
    async fn create_product(&self, seller_id: i32, input: CreateProduct)
        -> CatalogResult<Product>;

    /// Replace a product's caller-writable fields
    async fn update_product(&self, id: i32, input: CreateProduct) -> CatalogResult<Product>;

    /// Soft-delete a product
    async fn delete_product(&self, id: i32) -> CatalogResult<()>;

    /// Get an active product by id
    async fn get_product(&self, id: i32) -> CatalogResult<Option<Product>>;

    /// List active products
    async fn list_products(&self) -> CatalogResult<Vec<Product>>;

    /// List active products in an active category
    async fn list_products_by_category(&self, category_id: i32) -> CatalogResult<Vec<Product>>;

    /// Ranked full-text search over active products; ties break by id
    async fn search(&self, query: &str, limit: u64) -> CatalogResult<Vec<Product>>;
}

#[derive(Default)]
struct Inner {
    categories: HashMap<i32, Category>,
    products: HashMap<i32, Product>,
    documents: HashMap<i32, SearchDocument>,
    next_category_id: i32,
    next_product_id: i32,
}

impl Inner {
    fn active_category(&self, id: i32) -> Option<&Category> {
        self.categories.get(&id).filter(|c| c.is_active)
    }

    /// Walk the ancestor chain from `parent_id`; true if it reaches `id`.
    fn would_create_cycle(&self, id: i32, mut parent_id: Option<i32>) -> bool {
        while let Some(pid) = parent_id {
            if pid == id {
                return true;
            }
            parent_id = self.categories.get(&pid).and_then(|c| c.parent_id);
        }
        false
    }

    fn check_parent(&self, id: Option<i32>, parent_id: Option<i32>) -> CatalogResult<()> {
        if let Some(pid) = parent_id {
            if self.active_category(pid).is_none() {
                return Err(CatalogError::InvalidCategory(pid));
            }
            if let Some(id) = id {
                if self.would_create_cycle(id, parent_id) {
                    return Err(CatalogError::InvalidCategory(pid));
                }
            }
        }
        Ok(())
    }
}

/// In-memory implementation of [`CatalogRepository`] (for development and
/// tests). All invariant checks run under one write lock, mirroring the
/// transactional behavior of the PostgreSQL implementation.
#[derive(Default, Clone)]
pub struct InMemoryCatalogRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn create_category(&self, input: CreateCategory) -> CatalogResult<Category> {
        let mut inner = self.inner.write().await;

        inner.check_parent(None, input.parent_id)?;

        inner.next_category_id += 1;
        let category = Category {
            id: inner.next_category_id,
            name: input.name,
            parent_id: input.parent_id,
            is_active: true,
        };
        inner.categories.insert(category.id, category.clone());

        tracing::info!(category_id = category.id, "Created category");
        Ok(category)
    }

    async fn update_category(&self, id: i32, input: CreateCategory) -> CatalogResult<Category> {
        let mut inner = self.inner.write().await;

        if inner.active_category(id).is_none() {
            return Err(CatalogError::CategoryNotFound(id));
        }
        inner.check_parent(Some(id), input.parent_id)?;

        let category = inner.categories.get_mut(&id).unwrap();
        category.name = input.name;
        category.parent_id = input.parent_id;
        let updated = category.clone();

        tracing::info!(category_id = id, "Updated category");
        Ok(updated)
    }

    async fn delete_category(&self, id: i32) -> CatalogResult<()> {
        let mut inner = self.inner.write().await;

        if inner.active_category(id).is_none() {
            return Err(CatalogError::CategoryNotFound(id));
        }
        let in_use = inner
            .products
            .values()
            .any(|p| p.category_id == id && p.is_active);
        if in_use {
            return Err(CatalogError::CategoryInUse(id));
        }

        inner.categories.get_mut(&id).unwrap().is_active = false;

        tracing::info!(category_id = id, "Deactivated category");
        Ok(())
    }

    async fn get_category(&self, id: i32) -> CatalogResult<Option<Category>> {
        let inner = self.inner.read().await;
        Ok(inner.active_category(id).cloned())
    }

    async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        let inner = self.inner.read().await;
        let mut categories: Vec<Category> = inner
            .categories
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn create_product(
        &self,
        seller_id: i32,
        input: CreateProduct,
    ) -> CatalogResult<Product> {
        let mut inner = self.inner.write().await;

        if inner.active_category(input.category_id).is_none() {
            return Err(CatalogError::InvalidCategory(input.category_id));
        }

        inner.next_product_id += 1;
        let product = Product {
            id: inner.next_product_id,
            name: input.name,
            description: input.description,
            price: input.price,
            display_price: input.price as f64 / 100.0,
            image_url: input.image_url,
            stock: input.stock,
            is_active: true,
            category_id: input.category_id,
            seller_id,
            rating: 0.0,
        };

        let document = SearchDocument::build(&product.name, product.description.as_deref());
        inner.documents.insert(product.id, document);
        inner.products.insert(product.id, product.clone());

        tracing::info!(product_id = product.id, "Created product");
        Ok(product)
    }

    async fn update_product(&self, id: i32, input: CreateProduct) -> CatalogResult<Product> {
        let mut inner = self.inner.write().await;

        if !inner.products.get(&id).is_some_and(|p| p.is_active) {
            return Err(CatalogError::ProductNotFound(id));
        }
        if inner.active_category(input.category_id).is_none() {
            return Err(CatalogError::InvalidCategory(input.category_id));
        }

        let product = inner.products.get_mut(&id).unwrap();
        product.name = input.name;
        product.description = input.description;
        product.price = input.price;
        product.display_price = input.price as f64 / 100.0;
        product.image_url = input.image_url;
        product.stock = input.stock;
        product.category_id = input.category_id;
        let updated = product.clone();

        // Search representation follows every text write
        let document = SearchDocument::build(&updated.name, updated.description.as_deref());
        inner.documents.insert(id, document);

        tracing::info!(product_id = id, "Updated product");
        Ok(updated)
    }

    async fn delete_product(&self, id: i32) -> CatalogResult<()> {
        let mut inner = self.inner.write().await;

        if !inner.products.get(&id).is_some_and(|p| p.is_active) {
            return Err(CatalogError::ProductNotFound(id));
        }
        inner.products.get_mut(&id).unwrap().is_active = false;

        tracing::info!(product_id = id, "Deactivated product");
        Ok(())
    }

    async fn get_product(&self, id: i32) -> CatalogResult<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(&id).filter(|p| p.is_active).cloned())
    }

    async fn list_products(&self) -> CatalogResult<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn list_products_by_category(&self, category_id: i32) -> CatalogResult<Vec<Product>> {
        let inner = self.inner.read().await;

        if inner.active_category(category_id).is_none() {
            return Err(CatalogError::CategoryNotFound(category_id));
        }

        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| p.is_active && p.category_id == category_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn search(&self, query: &str, limit: u64) -> CatalogResult<Vec<Product>> {
        let inner = self.inner.read().await;

        let mut scored: Vec<(f64, &Product)> = inner
            .products
            .values()
            .filter(|p| p.is_active)
            .filter_map(|p| {
                let score = inner.documents.get(&p.id)?.score(query);
                (score > 0.0).then_some((score, p))
            })
            .collect();

        // Rank descending, ties by product id ascending for determinism
        scored.sort_by(|(sa, pa), (sb, pb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(pa.id.cmp(&pb.id))
        });

        Ok(scored
            .into_iter()
            .take(limit as usize)
            .map(|(_, p)| p.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> CreateCategory {
        CreateCategory {
            name: name.to_string(),
            parent_id: None,
        }
    }

    fn product(name: &str, category_id: i32) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            description: None,
            price: 1000,
            image_url: None,
            stock: 10,
            category_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_product() {
        let repo = InMemoryCatalogRepository::new();
        let cat = repo.create_category(category("Electronics")).await.unwrap();

        let created = repo.create_product(1, product("Keyboard", cat.id)).await.unwrap();
        assert_eq!(created.display_price, 10.0);
        assert_eq!(created.rating, 0.0);

        let fetched = repo.get_product(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Keyboard");
        assert_eq!(fetched.seller_id, 1);
    }

    #[tokio::test]
    async fn test_product_requires_active_category() {
        let repo = InMemoryCatalogRepository::new();
        let result = repo.create_product(1, product("Keyboard", 42)).await;
        assert!(matches!(result, Err(CatalogError::InvalidCategory(42))));

        let cat = repo.create_category(category("Short-lived")).await.unwrap();
        repo.delete_category(cat.id).await.unwrap();
        let result = repo.create_product(1, product("Keyboard", cat.id)).await;
        assert!(matches!(result, Err(CatalogError::InvalidCategory(_))));
    }

    #[tokio::test]
    async fn test_soft_deleted_product_is_hidden_and_delete_is_strict() {
        let repo = InMemoryCatalogRepository::new();
        let cat = repo.create_category(category("Electronics")).await.unwrap();
        let p = repo.create_product(1, product("Keyboard", cat.id)).await.unwrap();

        repo.delete_product(p.id).await.unwrap();
        assert!(repo.get_product(p.id).await.unwrap().is_none());
        assert!(repo.list_products().await.unwrap().is_empty());

        // Deleting again surfaces NotFound rather than succeeding silently
        let result = repo.delete_product(p.id).await;
        assert!(matches!(result, Err(CatalogError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_category_with_active_products_cannot_be_deleted() {
        let repo = InMemoryCatalogRepository::new();
        let cat = repo.create_category(category("Electronics")).await.unwrap();
        let p = repo.create_product(1, product("Keyboard", cat.id)).await.unwrap();

        let result = repo.delete_category(cat.id).await;
        assert!(matches!(result, Err(CatalogError::CategoryInUse(_))));

        repo.delete_product(p.id).await.unwrap();
        repo.delete_category(cat.id).await.unwrap();
        assert!(repo.get_category(cat.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_cycle_is_rejected() {
        let repo = InMemoryCatalogRepository::new();
        let root = repo.create_category(category("Root")).await.unwrap();
        let child = repo
            .create_category(CreateCategory {
                name: "Child".to_string(),
                parent_id: Some(root.id),
            })
            .await
            .unwrap();

        // Root -> Child -> Root would close a loop
        let result = repo
            .update_category(
                root.id,
                CreateCategory {
                    name: "Root".to_string(),
                    parent_id: Some(child.id),
                },
            )
            .await;
        assert!(matches!(result, Err(CatalogError::InvalidCategory(_))));

        // Self-parenting is the one-node cycle
        let result = repo
            .update_category(
                root.id,
                CreateCategory {
                    name: "Root".to_string(),
                    parent_id: Some(root.id),
                },
            )
            .await;
        assert!(matches!(result, Err(CatalogError::InvalidCategory(_))));
    }

    #[tokio::test]
    async fn test_list_products_by_category_filters_inactive() {
        let repo = InMemoryCatalogRepository::new();
        let cat = repo.create_category(category("Electronics")).await.unwrap();
        let other = repo.create_category(category("Stationery")).await.unwrap();

        let keep = repo.create_product(1, product("Keyboard", cat.id)).await.unwrap();
        let gone = repo.create_product(1, product("Headset", cat.id)).await.unwrap();
        repo.create_product(1, product("Notebook", other.id)).await.unwrap();
        repo.delete_product(gone.id).await.unwrap();

        let products = repo.list_products_by_category(cat.id).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, keep.id);

        let result = repo.list_products_by_category(99).await;
        assert!(matches!(result, Err(CatalogError::CategoryNotFound(99))));
    }

    #[tokio::test]
    async fn test_search_ranks_name_matches_above_description_matches() {
        let repo = InMemoryCatalogRepository::new();
        let cat = repo.create_category(category("Electronics")).await.unwrap();

        let by_description = repo
            .create_product(
                1,
                CreateProduct {
                    description: Some("a mechanical keyboard".to_string()),
                    ..product("Desk accessory", cat.id)
                },
            )
            .await
            .unwrap();
        let by_name = repo
            .create_product(1, product("Mechanical keyboard", cat.id))
            .await
            .unwrap();

        let hits = repo.search("keyboard", 10).await.unwrap();
        assert_eq!(
            hits.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![by_name.id, by_description.id]
        );
    }

    #[tokio::test]
    async fn test_search_ties_break_by_ascending_id() {
        let repo = InMemoryCatalogRepository::new();
        let cat = repo.create_category(category("Electronics")).await.unwrap();

        let first = repo.create_product(1, product("Usb hub", cat.id)).await.unwrap();
        let second = repo.create_product(1, product("Usb cable", cat.id)).await.unwrap();

        let hits = repo.search("usb", 10).await.unwrap();
        assert_eq!(
            hits.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
    }

    #[tokio::test]
    async fn test_search_follows_text_updates() {
        let repo = InMemoryCatalogRepository::new();
        let cat = repo.create_category(category("Electronics")).await.unwrap();
        let p = repo.create_product(1, product("Teapot", cat.id)).await.unwrap();

        assert_eq!(repo.search("teapot", 10).await.unwrap().len(), 1);

        repo.update_product(p.id, product("Kettle", cat.id)).await.unwrap();
        assert!(repo.search("teapot", 10).await.unwrap().is_empty());
        assert_eq!(repo.search("kettle", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_excludes_inactive_products() {
        let repo = InMemoryCatalogRepository::new();
        let cat = repo.create_category(category("Electronics")).await.unwrap();
        let p = repo.create_product(1, product("Keyboard", cat.id)).await.unwrap();

        repo.delete_product(p.id).await.unwrap();
        assert!(repo.search("keyboard", 10).await.unwrap().is_empty());
    }
}
