//! Integration tests for the orders domain against real PostgreSQL.
//!
//! These cover the serializable place/cancel transactions end to end:
//! conditional stock decrements, snapshot prices, cart cleanup, restock on
//! cancel, and the oversell race. Ignored by default (needs Docker).

use domain_cart::{CartRepository, PgCartRepository};
use domain_catalog::{CatalogRepository, CreateCategory, CreateProduct, PgCatalogRepository};
use domain_orders::{OrderError, OrderRepository, OrderStatus, PgOrderRepository};
use futures::future::join_all;
use test_utils::TestDatabase;

struct Fixture {
    catalog: PgCatalogRepository,
    cart: PgCartRepository,
    orders: PgOrderRepository,
}

impl Fixture {
    fn new(db: &TestDatabase) -> Self {
        Self {
            catalog: PgCatalogRepository::new(db.connection()),
            cart: PgCartRepository::new(db.connection()),
            orders: PgOrderRepository::new(db.connection()),
        }
    }

    async fn seed_product(&self, name: &str, price: i64, stock: i32) -> i32 {
        let category = match self.catalog.list_categories().await.unwrap().first() {
            Some(existing) => existing.clone(),
            None => self
                .catalog
                .create_category(CreateCategory {
                    name: "General".to_string(),
                    parent_id: None,
                })
                .await
                .unwrap(),
        };

        self.catalog
            .create_product(
                1,
                CreateProduct {
                    name: name.to_string(),
                    description: None,
                    price,
                    image_url: None,
                    stock,
                    category_id: category.id,
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn stock(&self, product_id: i32) -> i32 {
        self.catalog
            .get_product(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_place_order_snapshots_prices_and_clears_cart() {
    let db = TestDatabase::new().await;
    let fx = Fixture::new(&db);

    let keyboard = fx.seed_product("Keyboard", 4999, 5).await;
    let mouse = fx.seed_product("Mouse", 2500, 3).await;
    fx.cart.add_or_update(7, keyboard, 2).await.unwrap();
    fx.cart.add_or_update(7, mouse, 1).await.unwrap();

    let order = fx.orders.place_order(7).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, 2 * 4999 + 2500);
    assert_eq!(fx.stock(keyboard).await, 3);
    assert_eq!(fx.stock(mouse).await, 2);
    assert!(fx.cart.view(7).await.unwrap().items.is_empty());

    // A later price change never reaches the placed order
    let category_id = fx.catalog.get_product(keyboard).await.unwrap().unwrap().category_id;
    fx.catalog
        .update_product(
            keyboard,
            CreateProduct {
                name: "Keyboard".to_string(),
                description: None,
                price: 9999,
                image_url: None,
                stock: 3,
                category_id,
            },
        )
        .await
        .unwrap();

    let reread = fx.orders.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(reread.total_amount, 2 * 4999 + 2500);
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_mixed_cart_failure_leaves_no_partial_decrement() {
    let db = TestDatabase::new().await;
    let fx = Fixture::new(&db);

    let a = fx.seed_product("Product A", 1000, 5).await;
    let b = fx.seed_product("Product B", 2000, 1).await;
    fx.cart.add_or_update(7, a, 2).await.unwrap();
    fx.cart.add_or_update(7, b, 1).await.unwrap();

    // Drain B's stock from under the cart
    let other_user = 8;
    fx.cart.add_or_update(other_user, b, 1).await.unwrap();
    fx.orders.place_order(other_user).await.unwrap();

    let result = fx.orders.place_order(7).await;
    assert!(matches!(result, Err(OrderError::InsufficientStock { .. })));
    assert_eq!(fx.stock(a).await, 5);
    assert_eq!(fx.cart.view(7).await.unwrap().items.len(), 2);
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_cancel_restores_stock_once() {
    let db = TestDatabase::new().await;
    let fx = Fixture::new(&db);

    let product = fx.seed_product("Keyboard", 4999, 5).await;
    fx.cart.add_or_update(7, product, 4).await.unwrap();

    let order = fx.orders.place_order(7).await.unwrap();
    assert_eq!(fx.stock(product).await, 1);

    fx.orders.transition(order.id, OrderStatus::Paid).await.unwrap();
    fx.orders.cancel_order(order.id).await.unwrap();
    assert_eq!(fx.stock(product).await, 5);

    let result = fx.orders.cancel_order(order.id).await;
    assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
    assert_eq!(fx.stock(product).await, 5);
}

#[tokio::test]
#[ignore = "requires a running Docker daemon"]
async fn test_concurrent_orders_never_oversell() {
    let db = TestDatabase::new().await;
    let fx = Fixture::new(&db);

    let product = fx.seed_product("Limited run", 1000, 5).await;
    for user_id in 100..110 {
        fx.cart.add_or_update(user_id, product, 1).await.unwrap();
    }

    let attempts = (100..110).map(|user_id| {
        let orders = PgOrderRepository::new(db.connection());
        async move { orders.place_order(user_id).await }
    });
    let results = join_all(attempts).await;

    let placed = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(OrderError::InsufficientStock { .. }) | Err(OrderError::Serialization)
            )
        })
        .count();

    assert_eq!(placed + rejected, 10);
    assert!(placed <= 5, "sold {placed} units with only 5 in stock");
    assert_eq!(fx.stock(product).await, 5 - placed as i32);
}
