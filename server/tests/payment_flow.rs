//! Payment reconciliation tests with a scripted gateway.
//!
//! The mock gateway counts calls and can be told to decline, which pins
//! down the ordering discipline: gateway first, local commit last, and no
//! local change when the gateway says no.

use async_trait::async_trait;
use gugarden_server::db::models::{OrderStatus, ProductCreate, User};
use gugarden_server::db::repository;
use gugarden_server::db::DbService;
use gugarden_server::orders::{CreateOrderRequest, OrderService};
use gugarden_server::payments::{
    CancelPaymentRequest, ConfirmPaymentRequest, GatewayError, PaymentError, PaymentGateway,
    PaymentService, Provider,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Default)]
struct MockGateway {
    configured: bool,
    decline: bool,
    confirms: AtomicUsize,
    cancels: AtomicUsize,
}

impl MockGateway {
    fn live() -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            ..Default::default()
        })
    }

    fn declining() -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            decline: true,
            ..Default::default()
        })
    }

    fn unconfigured() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn provider(&self) -> &'static str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn confirm(
        &self,
        _payment_key: &str,
        _order_number: &str,
        _amount: i64,
    ) -> Result<(), GatewayError> {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        if self.decline {
            return Err(GatewayError::Declined("card limit exceeded".into()));
        }
        Ok(())
    }

    async fn cancel(&self, _payment_key: &str, _reason: &str) -> Result<(), GatewayError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if self.decline {
            return Err(GatewayError::Declined("refund window closed".into()));
        }
        Ok(())
    }
}

struct Fixture {
    db: DbService,
    orders: OrderService,
    gateway: Arc<MockGateway>,
    payments: PaymentService,
    user: i64,
    product: i64,
    order_id: i64,
    amount: i64,
    _dir: TempDir,
}

async fn setup(gateway: Arc<MockGateway>, production: bool) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("payments.db");
    let db = DbService::new(db_path.to_str().unwrap())
        .await
        .expect("open test db");
    let orders = OrderService::new(db.pool.clone());
    let payments = PaymentService::new(
        orders.clone(),
        gateway.clone(),
        gateway.clone(),
        production,
    );

    let hash = User::hash_password("password123").unwrap();
    let user = repository::user::create(&db.pool, "payer@test.local", &hash, "payer")
        .await
        .unwrap()
        .id;
    let product = repository::product::create(
        &db.pool,
        ProductCreate {
            name: "유기농 상추".to_string(),
            price: 7_000,
            sale_price: None,
            stock: 10,
        },
    )
    .await
    .unwrap()
    .id;
    repository::cart::add_item(&db.pool, user, product, 2)
        .await
        .unwrap();

    let created = orders
        .create_order(
            user,
            &CreateOrderRequest {
                recipient_name: "수취인".to_string(),
                recipient_phone: "010-1111-2222".to_string(),
                recipient_address: "주소".to_string(),
                recipient_address_detail: None,
                recipient_zipcode: None,
                memo: None,
                payment_method: None,
            },
        )
        .await
        .unwrap();

    Fixture {
        db,
        orders,
        gateway,
        payments,
        user,
        product,
        order_id: created.order_id,
        amount: created.total_amount,
        _dir: dir,
    }
}

#[tokio::test]
async fn confirm_marks_the_order_paid() {
    let f = setup(MockGateway::live(), false).await;

    let prepare = f
        .payments
        .prepare(Provider::Toss, f.order_id, f.user)
        .await
        .unwrap();
    assert_eq!(prepare.amount, f.amount);
    assert_eq!(prepare.order_name, "유기농 상추");
    assert!(!prepare.test_mode);

    let order = f
        .payments
        .confirm(
            Provider::Toss,
            f.user,
            &ConfirmPaymentRequest {
                order_id: f.order_id,
                payment_key: "tok_abc".to_string(),
                amount: f.amount,
            },
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.payment_key.as_deref(), Some("tok_abc"));
    assert_eq!(order.payment_method.as_deref(), Some("toss"));
    assert_eq!(f.gateway.confirms.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn amount_mismatch_never_reaches_the_gateway() {
    let f = setup(MockGateway::live(), false).await;

    let err = f
        .payments
        .confirm(
            Provider::Toss,
            f.user,
            &ConfirmPaymentRequest {
                order_id: f.order_id,
                payment_key: "tok_abc".to_string(),
                amount: f.amount - 1_000,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::AmountMismatch));
    assert_eq!(f.gateway.confirms.load(Ordering::SeqCst), 0);

    // Order untouched
    let status = f.payments.status(f.order_id, f.user).await.unwrap();
    assert_eq!(status.status, OrderStatus::Pending);
    assert!(status.payment_key.is_none());
}

#[tokio::test]
async fn declined_capture_leaves_the_order_pending() {
    let f = setup(MockGateway::declining(), false).await;

    let err = f
        .payments
        .confirm(
            Provider::Toss,
            f.user,
            &ConfirmPaymentRequest {
                order_id: f.order_id,
                payment_key: "tok_bad".to_string(),
                amount: f.amount,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::Gateway(GatewayError::Declined(_))));
    let status = f.payments.status(f.order_id, f.user).await.unwrap();
    assert_eq!(status.status, OrderStatus::Pending);
}

#[tokio::test]
async fn second_confirm_is_rejected() {
    let f = setup(MockGateway::live(), false).await;
    let req = ConfirmPaymentRequest {
        order_id: f.order_id,
        payment_key: "tok_abc".to_string(),
        amount: f.amount,
    };

    f.payments.confirm(Provider::Toss, f.user, &req).await.unwrap();
    let err = f.payments.confirm(Provider::Toss, f.user, &req).await.unwrap_err();
    assert!(matches!(err, PaymentError::NotPending(OrderStatus::Paid)));
    assert_eq!(f.gateway.confirms.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refund_cancels_the_order_and_restores_stock() {
    let f = setup(MockGateway::live(), false).await;
    f.payments
        .confirm(
            Provider::Toss,
            f.user,
            &ConfirmPaymentRequest {
                order_id: f.order_id,
                payment_key: "tok_abc".to_string(),
                amount: f.amount,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        repository::product::stock(&f.db.pool, f.product).await.unwrap(),
        Some(8)
    );

    let order = f
        .payments
        .cancel(
            Provider::Toss,
            f.user,
            &CancelPaymentRequest {
                order_id: f.order_id,
                reason: Some("단순 변심".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(f.gateway.cancels.load(Ordering::SeqCst), 1);
    assert_eq!(
        repository::product::stock(&f.db.pool, f.product).await.unwrap(),
        Some(10)
    );

    // A repeat refund finds no paid order and does not touch the gateway
    let err = f
        .payments
        .cancel(
            Provider::Toss,
            f.user,
            &CancelPaymentRequest {
                order_id: f.order_id,
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::NotPaid(OrderStatus::Cancelled)));
    assert_eq!(f.gateway.cancels.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refund_requires_a_captured_payment() {
    let f = setup(MockGateway::live(), false).await;

    let err = f
        .payments
        .cancel(
            Provider::Toss,
            f.user,
            &CancelPaymentRequest {
                order_id: f.order_id,
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::NotPaid(OrderStatus::Pending)));
    assert_eq!(f.gateway.cancels.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unconfigured_gateway_rehearses_outside_production() {
    let f = setup(MockGateway::unconfigured(), false).await;

    let prepare = f
        .payments
        .prepare(Provider::Toss, f.order_id, f.user)
        .await
        .unwrap();
    assert!(prepare.test_mode);

    let order = f
        .payments
        .confirm(
            Provider::Toss,
            f.user,
            &ConfirmPaymentRequest {
                order_id: f.order_id,
                payment_key: "rehearsal_key".to_string(),
                amount: f.amount,
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    // The gateway was never called
    assert_eq!(f.gateway.confirms.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unconfigured_gateway_is_a_hard_error_in_production() {
    let f = setup(MockGateway::unconfigured(), true).await;

    let err = f
        .payments
        .prepare(Provider::Toss, f.order_id, f.user)
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Unconfigured));

    let err = f
        .payments
        .confirm(
            Provider::Toss,
            f.user,
            &ConfirmPaymentRequest {
                order_id: f.order_id,
                payment_key: "tok_abc".to_string(),
                amount: f.amount,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Unconfigured));

    let status = f.payments.status(f.order_id, f.user).await.unwrap();
    assert_eq!(status.status, OrderStatus::Pending);
}

#[tokio::test]
async fn payments_are_owner_scoped() {
    let f = setup(MockGateway::live(), false).await;
    let hash = User::hash_password("password123").unwrap();
    let stranger = repository::user::create(&f.db.pool, "other@test.local", &hash, "other")
        .await
        .unwrap()
        .id;

    let err = f
        .payments
        .prepare(Provider::Toss, f.order_id, stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Order(_)));

    // keep the order service alive in the fixture
    let _ = &f.orders;
}
