//! Order lifecycle integration tests against a real SQLite database

use gugarden_server::db::models::{OrderStatus, ProductCreate, User};
use gugarden_server::db::repository;
use gugarden_server::db::DbService;
use gugarden_server::orders::{
    CreateOrderRequest, OrderError, OrderService, FLAT_SHIPPING_FEE, FREE_SHIPPING_THRESHOLD,
};
use tempfile::TempDir;

async fn setup() -> (DbService, OrderService, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("test.db");
    let db = DbService::new(db_path.to_str().unwrap())
        .await
        .expect("open test db");
    let orders = OrderService::new(db.pool.clone());
    (db, orders, dir)
}

async fn seed_user(db: &DbService, email: &str) -> i64 {
    let hash = User::hash_password("password123").unwrap();
    repository::user::create(&db.pool, email, &hash, "tester")
        .await
        .expect("create user")
        .id
}

async fn seed_product(db: &DbService, name: &str, price: i64, stock: i64) -> i64 {
    repository::product::create(
        &db.pool,
        ProductCreate {
            name: name.to_string(),
            price,
            sale_price: None,
            stock,
        },
    )
    .await
    .expect("create product")
    .id
}

fn recipient() -> CreateOrderRequest {
    CreateOrderRequest {
        recipient_name: "홍길동".to_string(),
        recipient_phone: "010-1234-5678".to_string(),
        recipient_address: "서울시 어딘가 1".to_string(),
        recipient_address_detail: None,
        recipient_zipcode: Some("04524".to_string()),
        memo: None,
        payment_method: None,
    }
}

#[tokio::test]
async fn checkout_computes_totals_and_clears_cart() {
    let (db, orders, _dir) = setup().await;
    let user = seed_user(&db, "a@test.local").await;
    let product = seed_product(&db, "사과 한 박스", 30_000, 10).await;

    repository::cart::add_item(&db.pool, user, product, 2)
        .await
        .unwrap();

    let created = orders.create_order(user, &recipient()).await.unwrap();

    // 2 x 30000 = 60000 is over the free shipping threshold
    assert_eq!(created.shipping_fee, 0);
    assert_eq!(created.total_amount, 60_000);
    assert!(created.order_number.starts_with("GG"));
    assert_eq!(created.order_number.len(), 14);

    // Cart emptied, stock reserved
    let cart = repository::cart::lines_for_user(&db.pool, user).await.unwrap();
    assert!(cart.is_empty());
    let stock = repository::product::stock(&db.pool, product).await.unwrap();
    assert_eq!(stock, Some(8));

    let detail = orders.detail_for_user(created.order_id, user).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 2);
    assert_eq!(detail.items[0].product_price, 30_000);
}

#[tokio::test]
async fn checkout_below_threshold_pays_flat_shipping() {
    let (db, orders, _dir) = setup().await;
    let user = seed_user(&db, "b@test.local").await;
    let product = seed_product(&db, "배 한 알", 10_000, 5).await;

    repository::cart::add_item(&db.pool, user, product, 1)
        .await
        .unwrap();

    let created = orders.create_order(user, &recipient()).await.unwrap();
    assert_eq!(created.shipping_fee, FLAT_SHIPPING_FEE);
    assert_eq!(created.total_amount, 10_000 + FLAT_SHIPPING_FEE);
}

#[tokio::test]
async fn checkout_uses_sale_price_when_present() {
    let (db, orders, _dir) = setup().await;
    let user = seed_user(&db, "sale@test.local").await;
    let product = repository::product::create(
        &db.pool,
        ProductCreate {
            name: "할인 감".to_string(),
            price: 20_000,
            sale_price: Some(15_000),
            stock: 3,
        },
    )
    .await
    .unwrap()
    .id;

    repository::cart::add_item(&db.pool, user, product, 2)
        .await
        .unwrap();

    let created = orders.create_order(user, &recipient()).await.unwrap();
    // 2 x 15000 + flat shipping
    assert_eq!(created.total_amount, 30_000 + FLAT_SHIPPING_FEE);
}

#[tokio::test]
async fn checkout_totals_hold_for_randomized_carts() {
    use rand::Rng;

    let (db, orders, _dir) = setup().await;
    let mut rng = rand::thread_rng();

    for round in 0..5 {
        let user = seed_user(&db, &format!("rand{round}@test.local")).await;
        let line_count = rng.gen_range(2..=5);
        // (product_id, effective unit price, quantity) as seeded
        let mut expected: Vec<(i64, i64, i64)> = Vec::new();

        for n in 0..line_count {
            let price = rng.gen_range(1..=60) * 1_000;
            let sale_price = rng.gen_bool(0.5).then(|| rng.gen_range(500..=price));
            let quantity = rng.gen_range(1..=4);
            let product = repository::product::create(
                &db.pool,
                ProductCreate {
                    name: format!("무작위 상품 {round}-{n}"),
                    price,
                    sale_price,
                    stock: quantity + rng.gen_range(0..=3),
                },
            )
            .await
            .unwrap()
            .id;
            repository::cart::add_item(&db.pool, user, product, quantity)
                .await
                .unwrap();
            expected.push((product, sale_price.unwrap_or(price), quantity));
        }

        let created = orders.create_order(user, &recipient()).await.unwrap();

        let subtotal: i64 = expected.iter().map(|(_, price, qty)| price * qty).sum();
        let fee = if subtotal >= FREE_SHIPPING_THRESHOLD {
            0
        } else {
            FLAT_SHIPPING_FEE
        };
        assert_eq!(created.shipping_fee, fee, "fee for subtotal {subtotal}");
        assert_eq!(created.total_amount, subtotal + fee);

        // Every line froze its effective price and quantity
        let detail = orders.detail_for_user(created.order_id, user).await.unwrap();
        assert_eq!(detail.items.len(), expected.len());
        for (product_id, unit_price, quantity) in &expected {
            let item = detail
                .items
                .iter()
                .find(|item| item.product_id == *product_id)
                .expect("ordered line missing from order items");
            assert_eq!(item.product_price, *unit_price);
            assert_eq!(item.quantity, *quantity);
        }
    }
}

#[tokio::test]
async fn checkout_rejects_empty_cart() {
    let (db, orders, _dir) = setup().await;
    let user = seed_user(&db, "c@test.local").await;

    let err = orders.create_order(user, &recipient()).await.unwrap_err();
    assert!(matches!(err, OrderError::EmptyCart));
}

#[tokio::test]
async fn checkout_rejects_blank_recipient() {
    let (db, orders, _dir) = setup().await;
    let user = seed_user(&db, "blank@test.local").await;
    let product = seed_product(&db, "감자", 5_000, 5).await;
    repository::cart::add_item(&db.pool, user, product, 1)
        .await
        .unwrap();

    let mut req = recipient();
    req.recipient_phone = "   ".to_string();
    let err = orders.create_order(user, &req).await.unwrap_err();
    assert!(matches!(err, OrderError::MissingRecipient));
}

#[tokio::test]
async fn insufficient_stock_reserves_nothing() {
    let (db, orders, _dir) = setup().await;
    let user = seed_user(&db, "d@test.local").await;
    let plenty = seed_product(&db, "쌀 10kg", 40_000, 100).await;
    let scarce = seed_product(&db, "한정판 꿀", 25_000, 1).await;

    repository::cart::add_item(&db.pool, user, plenty, 2).await.unwrap();
    repository::cart::add_item(&db.pool, user, scarce, 3).await.unwrap();

    let err = orders.create_order(user, &recipient()).await.unwrap_err();
    match err {
        OrderError::InsufficientStock { product, remaining } => {
            assert_eq!(product, "한정판 꿀");
            assert_eq!(remaining, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // The whole reservation rolled back; the cart survives
    assert_eq!(
        repository::product::stock(&db.pool, plenty).await.unwrap(),
        Some(100)
    );
    assert_eq!(
        repository::product::stock(&db.pool, scarce).await.unwrap(),
        Some(1)
    );
    let cart = repository::cart::lines_for_user(&db.pool, user).await.unwrap();
    assert_eq!(cart.len(), 2);
}

#[tokio::test]
async fn cancel_pending_restores_stock_once() {
    let (db, orders, _dir) = setup().await;
    let user = seed_user(&db, "e@test.local").await;
    let product = seed_product(&db, "양파망", 8_000, 10).await;

    repository::cart::add_item(&db.pool, user, product, 4).await.unwrap();
    let created = orders.create_order(user, &recipient()).await.unwrap();
    assert_eq!(
        repository::product::stock(&db.pool, product).await.unwrap(),
        Some(6)
    );

    let cancelled = orders.cancel_order(created.order_id, user).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(
        repository::product::stock(&db.pool, product).await.unwrap(),
        Some(10)
    );

    // A second cancel must not release stock again
    let err = orders.cancel_order(created.order_id, user).await.unwrap_err();
    assert!(matches!(err, OrderError::NotCancellable(OrderStatus::Cancelled)));
    assert_eq!(
        repository::product::stock(&db.pool, product).await.unwrap(),
        Some(10)
    );
}

#[tokio::test]
async fn status_walks_the_lifecycle_and_rejects_skips() {
    let (db, orders, _dir) = setup().await;
    let user = seed_user(&db, "f@test.local").await;
    let product = seed_product(&db, "고구마", 12_000, 5).await;
    repository::cart::add_item(&db.pool, user, product, 1).await.unwrap();
    let created = orders.create_order(user, &recipient()).await.unwrap();

    // pending cannot jump to shipped
    let err = orders
        .set_status(created.order_id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped
        }
    ));

    orders.mark_paid(created.order_id, "pay_key_1", Some("toss")).await.unwrap();
    for next in [OrderStatus::Preparing, OrderStatus::Shipped, OrderStatus::Delivered] {
        let order = orders.set_status(created.order_id, next).await.unwrap();
        assert_eq!(order.status, next);
    }

    // delivered is terminal
    let err = orders
        .set_status(created.order_id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
async fn mark_paid_is_idempotent_via_cas() {
    let (db, orders, _dir) = setup().await;
    let user = seed_user(&db, "g@test.local").await;
    let product = seed_product(&db, "대파", 4_000, 5).await;
    repository::cart::add_item(&db.pool, user, product, 1).await.unwrap();
    let created = orders.create_order(user, &recipient()).await.unwrap();

    let paid = orders.mark_paid(created.order_id, "pay_key_2", Some("toss")).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(paid.payment_key.as_deref(), Some("pay_key_2"));
    assert!(paid.paid_at.is_some());

    let err = orders
        .mark_paid(created.order_id, "pay_key_other", Some("toss"))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::AlreadyProcessed(OrderStatus::Paid)));

    // The original payment key survives the retry
    let detail = orders.detail_for_user(created.order_id, user).await.unwrap();
    assert_eq!(detail.order.payment_key.as_deref(), Some("pay_key_2"));
}

#[tokio::test]
async fn orders_are_invisible_to_other_users() {
    let (db, orders, _dir) = setup().await;
    let alice = seed_user(&db, "alice@test.local").await;
    let mallory = seed_user(&db, "mallory@test.local").await;
    let product = seed_product(&db, "버섯", 9_000, 5).await;
    repository::cart::add_item(&db.pool, alice, product, 1).await.unwrap();
    let created = orders.create_order(alice, &recipient()).await.unwrap();

    let err = orders.detail_for_user(created.order_id, mallory).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound));
    let err = orders.cancel_order(created.order_id, mallory).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound));

    // The owner still sees it
    assert!(orders.detail_for_user(created.order_id, alice).await.is_ok());
    let mine = orders.list_for_user(mallory).await.unwrap();
    assert!(mine.is_empty());
}
