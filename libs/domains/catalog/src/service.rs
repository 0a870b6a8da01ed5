use std::sync::Arc;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Category, CreateCategory, CreateProduct, Product};
use crate::repository::CatalogRepository;

/// Service layer for catalog business logic
#[derive(Clone)]
pub struct CatalogService<R: CatalogRepository> {
    repository: Arc<R>,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub async fn create_category(&self, input: CreateCategory) -> CatalogResult<Category> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository.create_category(input).await
    }

    pub async fn update_category(&self, id: i32, input: CreateCategory) -> CatalogResult<Category> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository.update_category(id, input).await
    }

    pub async fn delete_category(&self, id: i32) -> CatalogResult<()> {
        self.repository.delete_category(id).await
    }

    pub async fn get_category(&self, id: i32) -> CatalogResult<Category> {
        self.repository
            .get_category(id)
            .await?
            .ok_or(CatalogError::CategoryNotFound(id))
    }

    pub async fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        self.repository.list_categories().await
    }

    pub async fn create_product(
        &self,
        seller_id: i32,
        input: CreateProduct,
    ) -> CatalogResult<Product> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository.create_product(seller_id, input).await
    }

    pub async fn update_product(&self, id: i32, input: CreateProduct) -> CatalogResult<Product> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository.update_product(id, input).await
    }

    pub async fn delete_product(&self, id: i32) -> CatalogResult<()> {
        self.repository.delete_product(id).await
    }

    pub async fn get_product(&self, id: i32) -> CatalogResult<Product> {
        self.repository
            .get_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    pub async fn list_products(&self) -> CatalogResult<Vec<Product>> {
        self.repository.list_products().await
    }

    pub async fn list_products_by_category(&self, category_id: i32) -> CatalogResult<Vec<Product>> {
        self.repository.list_products_by_category(category_id).await
    }

    /// Ranked search; a blank query matches nothing
    pub async fn search_products(&self, query: &str, limit: u64) -> CatalogResult<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.repository.search(query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCatalogRepository;

    #[tokio::test]
    async fn test_create_category_rejects_short_name() {
        // No expectations: a repository call would panic the mock
        let service = CatalogService::new(MockCatalogRepository::new());

        let result = service
            .create_category(CreateCategory {
                name: "ab".to_string(),
                parent_id: None,
            })
            .await;

        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_product_rejects_non_positive_price() {
        let service = CatalogService::new(MockCatalogRepository::new());

        let result = service
            .create_product(
                1,
                CreateProduct {
                    name: "Keyboard".to_string(),
                    description: None,
                    price: 0,
                    image_url: None,
                    stock: 1,
                    category_id: 1,
                },
            )
            .await;

        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_product_maps_missing_to_not_found() {
        let mut mock = MockCatalogRepository::new();
        mock.expect_get_product().returning(|_| Ok(None));

        let service = CatalogService::new(mock);
        let result = service.get_product(7).await;

        assert!(matches!(result, Err(CatalogError::ProductNotFound(7))));
    }

    #[tokio::test]
    async fn test_blank_search_query_short_circuits() {
        // No search expectation: the repository must not be hit
        let service = CatalogService::new(MockCatalogRepository::new());

        let hits = service.search_products("   ", 10).await.unwrap();
        assert!(hits.is_empty());
    }
}
