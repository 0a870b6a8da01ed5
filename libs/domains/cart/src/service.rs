use std::sync::Arc;
use validator::Validate;

use crate::error::{CartError, CartResult};
use crate::models::{AddToCart, CartItem, CartView, SetQuantity};
use crate::repository::CartRepository;

/// Service layer for cart business logic
#[derive(Clone)]
pub struct CartService<R: CartRepository> {
    repository: Arc<R>,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub async fn add_or_update(&self, user_id: i32, input: AddToCart) -> CartResult<CartItem> {
        input
            .validate()
            .map_err(|e| CartError::Validation(e.to_string()))?;

        self.repository
            .add_or_update(user_id, input.product_id, input.quantity)
            .await
    }

    pub async fn set_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        input: SetQuantity,
    ) -> CartResult<CartItem> {
        input
            .validate()
            .map_err(|e| CartError::Validation(e.to_string()))?;

        self.repository
            .set_quantity(user_id, product_id, input.quantity)
            .await
    }

    pub async fn remove(&self, user_id: i32, product_id: i32) -> CartResult<()> {
        self.repository.remove(user_id, product_id).await
    }

    pub async fn view(&self, user_id: i32) -> CartResult<CartView> {
        self.repository.view(user_id).await
    }
}
