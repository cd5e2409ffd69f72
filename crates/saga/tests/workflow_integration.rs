//! Integration tests for the order workflow, the stock ledger and the
//! payment consumer wired together in memory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, ProductId, StockId, UserId};
use domain::{Money, OrderLine, OrderRequest, OrderStatus};
use ledger::{InMemoryStockLedger, NewStock, StockLedger, StockRecord};
use messaging::{
    EventBus, EventConsumer, EventPublisher, OrderEventLogger, PaymentCompleted, PaymentStatus,
};
use rust_decimal_macros::dec;
use saga::{
    AutoPaymentHandler, InMemoryProductCatalog, InMemoryUserDirectory, LedgerStockService, Lookup,
    OrderWorkflow, PaymentCompletedHandler, PaymentProcessor, Product, StockCallError,
    StockService, User, WorkflowConfig, WorkflowError,
};

/// Stock proxy that yields to the scheduler before every call, so
/// concurrent workflow operations interleave at each remote step.
struct YieldingStock(LedgerStockService);

#[async_trait]
impl StockService for YieldingStock {
    async fn get_by_product(&self, product_id: &ProductId) -> Lookup<StockRecord> {
        tokio::task::yield_now().await;
        self.0.get_by_product(product_id).await
    }

    async fn reserve(&self, id: StockId, quantity: u32) -> Result<StockRecord, StockCallError> {
        tokio::task::yield_now().await;
        self.0.reserve(id, quantity).await
    }

    async fn release(&self, id: StockId, quantity: u32) -> Result<StockRecord, StockCallError> {
        tokio::task::yield_now().await;
        self.0.release(id, quantity).await
    }
}
use store::InMemoryOrderRepository;

struct TestHarness {
    workflow: OrderWorkflow,
    ledger: Arc<InMemoryStockLedger>,
    bus: EventBus,
}

impl TestHarness {
    async fn new(config: WorkflowConfig) -> Self {
        let users = InMemoryUserDirectory::new();
        users
            .insert(User::new(UserId::new(1), "Ada", "ada@example.com"))
            .await;
        users
            .insert(User::new(UserId::new(2), "Brian", "brian@example.com"))
            .await;

        let products = InMemoryProductCatalog::new();
        products
            .insert(Product::new("P", "Widget", Money::new(dec!(19.99))))
            .await;
        products
            .insert(Product::new("Q", "Gadget", Money::new(dec!(5.00))))
            .await;

        let ledger = Arc::new(InMemoryStockLedger::new());
        ledger.create(NewStock::new("P", 10)).await.unwrap();
        ledger.create(NewStock::new("Q", 3)).await.unwrap();

        let bus = EventBus::new(64);
        let workflow = OrderWorkflow::new(
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(store::InMemorySequenceGenerator::new()),
            Arc::new(users),
            Arc::new(products),
            Arc::new(YieldingStock(LedgerStockService::new(ledger.clone()))),
            Arc::new(bus.clone()),
        )
        .with_config(config);

        Self {
            workflow,
            ledger,
            bus,
        }
    }

    async fn stock(&self, product: &str) -> (u32, u32) {
        let record = self
            .ledger
            .get_by_product(&common::ProductId::new(product))
            .await
            .unwrap();
        (record.quantity, record.reserved_quantity)
    }

    async fn order(&self, user: i64, lines: &[(&str, u32)]) -> Result<domain::Order, WorkflowError> {
        let items = lines
            .iter()
            .map(|(product, qty)| OrderLine::new(*product, *qty))
            .collect();
        self.workflow
            .create_order(OrderRequest::new(UserId::new(user), items))
            .await
    }

    async fn wait_for_status(&self, id: OrderId, status: OrderStatus) -> OrderStatus {
        let mut current = self.workflow.get_order(id).await.unwrap().status();
        for _ in 0..100 {
            if current == status {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            current = self.workflow.get_order(id).await.unwrap().status();
        }
        current
    }
}

#[tokio::test]
async fn test_total_and_reservations_match_request() {
    let h = TestHarness::new(WorkflowConfig::default()).await;

    let order = h.order(1, &[("P", 2), ("Q", 3)]).await.unwrap();

    assert_eq!(order.total_amount(), Money::new(dec!(54.98)));
    assert_eq!(h.stock("P").await, (10, 2));
    assert_eq!(h.stock("Q").await, (3, 3));
}

#[tokio::test]
async fn test_exhausted_stock_rejects_next_order() {
    let h = TestHarness::new(WorkflowConfig::default()).await;

    h.order(1, &[("P", 10)]).await.unwrap();
    assert_eq!(h.stock("P").await, (10, 10));

    let err = h.order(2, &[("P", 1)]).await.unwrap_err();
    match err {
        WorkflowError::InsufficientStock {
            product_name,
            available,
            requested,
        } => {
            assert_eq!(product_name, "Widget");
            assert_eq!(available, 0);
            assert_eq!(requested, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_orders_never_oversell() {
    let h = Arc::new(TestHarness::new(WorkflowConfig::default()).await);

    let attempts = (0..25).map(|i| {
        let h = Arc::clone(&h);
        tokio::spawn(async move { h.order(1 + i % 2, &[("P", 1)]).await })
    });
    let results = futures_util::future::join_all(attempts).await;

    let mut created = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => created += 1,
            Err(WorkflowError::InsufficientStock { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 10);
    assert_eq!(h.stock("P").await, (10, 10));
    assert_eq!(h.workflow.list_orders().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_legacy_mode_leaves_first_reservation_after_second_item_fails() {
    let h = TestHarness::new(WorkflowConfig::legacy()).await;

    let err = h.order(1, &[("P", 2), ("Q", 4)]).await.unwrap_err();

    assert!(matches!(err, WorkflowError::InsufficientStock { .. }));
    assert!(h.workflow.list_orders().await.unwrap().is_empty());
    assert_eq!(h.stock("P").await, (10, 2));
}

#[tokio::test]
async fn test_compensation_restores_first_reservation_after_second_item_fails() {
    let h = TestHarness::new(WorkflowConfig::default()).await;

    h.order(1, &[("P", 2), ("Q", 4)]).await.unwrap_err();

    assert!(h.workflow.list_orders().await.unwrap().is_empty());
    assert_eq!(h.stock("P").await, (10, 0));
    assert_eq!(h.stock("Q").await, (3, 0));
}

#[tokio::test]
async fn test_cancel_restores_pre_order_levels() {
    let h = TestHarness::new(WorkflowConfig::default()).await;
    h.order(2, &[("P", 1)]).await.unwrap();
    let before = (h.stock("P").await, h.stock("Q").await);

    let order = h.order(1, &[("P", 4), ("Q", 2)]).await.unwrap();
    h.workflow.cancel_order(order.id()).await.unwrap();

    assert_eq!((h.stock("P").await, h.stock("Q").await), before);
}

#[tokio::test]
async fn test_cancelling_delivered_order_changes_nothing() {
    let h = TestHarness::new(WorkflowConfig::legacy()).await;
    let order = h.order(1, &[("P", 4)]).await.unwrap();
    h.workflow
        .update_order_status(order.id(), "DELIVERED")
        .await
        .unwrap();

    let err = h.workflow.cancel_order(order.id()).await.unwrap_err();

    assert!(matches!(err, WorkflowError::OrderNotCancellable { .. }));
    assert_eq!(h.stock("P").await, (10, 4));
    assert_eq!(
        h.workflow.get_order(order.id()).await.unwrap().status(),
        OrderStatus::Delivered
    );
}

#[tokio::test]
async fn test_payment_success_marks_order_paid() {
    let h = TestHarness::new(WorkflowConfig::default()).await;
    let consumer = EventConsumer::new()
        .with_handler(Arc::new(OrderEventLogger))
        .with_handler(Arc::new(PaymentCompletedHandler::new(h.workflow.clone())))
        .spawn(h.bus.subscribe());

    let order = h.order(1, &[("P", 1)]).await.unwrap();
    h.bus
        .publish(
            PaymentCompleted::new(order.id(), PaymentStatus::Success)
                .to_envelope()
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        h.wait_for_status(order.id(), OrderStatus::Paid).await,
        OrderStatus::Paid
    );
    consumer.shutdown().await;
}

#[tokio::test]
async fn test_payment_for_unknown_order_has_no_side_effect() {
    let h = TestHarness::new(WorkflowConfig::default()).await;
    let handler = PaymentCompletedHandler::new(h.workflow.clone());
    let order = h.order(1, &[("P", 1)]).await.unwrap();

    let event = PaymentCompleted::new(OrderId::new(999), PaymentStatus::Success)
        .to_envelope()
        .unwrap();
    let consumer = EventConsumer::new().with_handler(Arc::new(handler));

    assert_eq!(consumer.dispatch(&event).await, 0);
    assert_eq!(h.workflow.list_orders().await.unwrap().len(), 1);
    assert_eq!(
        h.workflow.get_order(order.id()).await.unwrap().status(),
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn test_failed_payment_is_log_only() {
    let h = TestHarness::new(WorkflowConfig::default()).await;
    let consumer = EventConsumer::new()
        .with_handler(Arc::new(PaymentCompletedHandler::new(h.workflow.clone())));
    let order = h.order(1, &[("P", 3)]).await.unwrap();

    let event = PaymentCompleted::new(order.id(), PaymentStatus::Failed)
        .to_envelope()
        .unwrap();
    consumer.dispatch(&event).await;

    assert_eq!(
        h.workflow.get_order(order.id()).await.unwrap().status(),
        OrderStatus::Pending
    );
    assert_eq!(h.stock("P").await, (10, 3));
}

#[tokio::test]
async fn test_auto_payment_round_trip() {
    let h = TestHarness::new(WorkflowConfig::default()).await;
    let processor = PaymentProcessor::new(Arc::new(h.bus.clone()));
    let consumer = EventConsumer::new()
        .with_handler(Arc::new(AutoPaymentHandler::new(processor)))
        .with_handler(Arc::new(PaymentCompletedHandler::new(h.workflow.clone())))
        .spawn(h.bus.subscribe());

    let order = h.order(1, &[("Q", 1)]).await.unwrap();

    assert_eq!(
        h.wait_for_status(order.id(), OrderStatus::Paid).await,
        OrderStatus::Paid
    );
    consumer.shutdown().await;
}

#[tokio::test]
async fn test_stock_ids_are_sequential() {
    let h = TestHarness::new(WorkflowConfig::default()).await;
    let ids: Vec<StockId> = h
        .ledger
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![StockId::new(1), StockId::new(2)]);
}

#[tokio::test]
async fn test_concurrent_cancels_release_once() {
    let h = TestHarness::new(WorkflowConfig::default()).await;
    let a = h.order(1, &[("P", 3)]).await.unwrap();
    h.order(2, &[("P", 3)]).await.unwrap();
    assert_eq!(h.stock("P").await, (10, 6));

    let (first, second) = tokio::join!(
        h.workflow.cancel_order(a.id()),
        h.workflow.cancel_order(a.id())
    );

    assert_eq!(first.unwrap().status(), OrderStatus::Cancelled);
    assert_eq!(second.unwrap().status(), OrderStatus::Cancelled);
    assert_eq!(h.stock("P").await, (10, 3));
}

#[tokio::test]
async fn test_cancel_and_payment_do_not_both_apply() {
    let h = TestHarness::new(WorkflowConfig::default()).await;
    let order = h.order(1, &[("P", 2)]).await.unwrap();

    let (cancelled, paid) = tokio::join!(
        h.workflow.cancel_order(order.id()),
        h.workflow.set_order_status(order.id(), OrderStatus::Paid)
    );

    let stored = h.workflow.get_order(order.id()).await.unwrap().status();
    match (cancelled, paid) {
        // cancel ran first, payment then hit a cancelled order
        (Ok(_), Err(WorkflowError::InvalidTransition { .. })) => {
            assert_eq!(stored, OrderStatus::Cancelled);
            assert_eq!(h.stock("P").await, (10, 0));
        }
        // payment ran first, cancel then saw a paid order
        (Ok(_), Ok(_)) => {
            assert_eq!(stored, OrderStatus::Cancelled);
            assert_eq!(h.stock("P").await, (10, 2));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}
