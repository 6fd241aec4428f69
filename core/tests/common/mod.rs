// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset.

use async_trait::async_trait;
use cacao_checkout::checkout::CheckoutForm;
use cacao_checkout::error::{CheckoutError, FlowError, Result};
use cacao_checkout::model::{
  Cart, CartItem, Order, OrderLineItem, OrderStatus, Payment, PaymentGateway, PaymentOrderSummary, PaymentStatus,
};
use cacao_checkout::ports::{
  CartService, CreateOrderRequest, OrderMutationResult, OrderService, PaymentGatewayClient, PaymentSession,
  PaymentSessionRequest, PaymentVerification, UpdateOrderStatusRequest, VerifyPaymentRequest,
};
use cacao_checkout::{CheckoutCoordinator, CheckoutSettings, MemorySessionStore, SessionContext, StepControl};
use cacao_checkout::flow::handler::HandlerFuture;
use cacao_checkout::FlowData;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

// --- Pipeline test data ---

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Flow error: {0}")]
  Flow(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

pub fn simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> impl Fn(FlowData<TestContext>) -> HandlerFuture<TestError> + Send + Sync + 'static {
  move |ctx: FlowData<TestContext>| -> HandlerFuture<TestError> {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(StepControl::Stop);
      }
      Ok(StepControl::Continue)
    })
  }
}

pub fn failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> impl Fn(FlowData<TestContext>) -> HandlerFuture<TestError> + Send + Sync + 'static {
  move |ctx: FlowData<TestContext>| -> HandlerFuture<TestError> {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  }
}

// --- Tracing ---

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Scripted backend ---

/// What a fake call answers with.
#[derive(Clone, Debug)]
pub enum Reply<T> {
  Ok(T),
  Service(String),
  Network(String),
}

impl<T: Clone> Reply<T> {
  fn to_result(&self) -> Result<T> {
    match self {
      Reply::Ok(value) => Ok(value.clone()),
      Reply::Service(m) => Err(CheckoutError::Service(m.clone())),
      Reply::Network(m) => Err(CheckoutError::Network(m.clone())),
    }
  }
}

/// In-memory stand-in for the GraphQL backend, counting every call.
pub struct FakeBackend {
  pub create_order_calls: AtomicUsize,
  pub create_session_calls: AtomicUsize,
  pub verify_calls: AtomicUsize,
  pub payment_calls: AtomicUsize,
  pub order_calls: AtomicUsize,
  pub update_status_calls: AtomicUsize,
  pub cart_calls: AtomicUsize,

  pub order_reply: Mutex<Reply<OrderMutationResult>>,
  pub session_reply: Mutex<Reply<PaymentSession>>,
  pub verify_reply: Mutex<Reply<PaymentVerification>>,
  pub update_reply: Mutex<Reply<OrderMutationResult>>,
  /// Consumed front to back; the last entry repeats.
  pub payment_script: Mutex<VecDeque<Reply<Option<Payment>>>>,
  pub payment_delay: Mutex<Duration>,
  pub order_delay: Mutex<Duration>,
  pub orders: Mutex<HashMap<String, Order>>,
  pub carts: Mutex<HashMap<String, Cart>>,

  pub order_requests: Mutex<Vec<CreateOrderRequest>>,
  pub session_requests: Mutex<Vec<(PaymentSessionRequest, String)>>,
  pub verify_requests: Mutex<Vec<VerifyPaymentRequest>>,
  pub status_updates: Mutex<Vec<UpdateOrderStatusRequest>>,
}

impl Default for FakeBackend {
  fn default() -> Self {
    let order = sample_order();
    Self {
      create_order_calls: AtomicUsize::new(0),
      create_session_calls: AtomicUsize::new(0),
      verify_calls: AtomicUsize::new(0),
      payment_calls: AtomicUsize::new(0),
      order_calls: AtomicUsize::new(0),
      update_status_calls: AtomicUsize::new(0),
      cart_calls: AtomicUsize::new(0),
      order_reply: Mutex::new(Reply::Ok(OrderMutationResult {
        success: true,
        message: None,
        order: Some(order.clone()),
      })),
      session_reply: Mutex::new(Reply::Ok(PaymentSession {
        success: true,
        message: None,
        payment_url: Some("https://pay.ziina.com/checkout/pay_abc".to_string()),
        payment_id: Some("pay_abc".to_string()),
        expires_at: None,
        gateway_response: serde_json::Value::Null,
      })),
      verify_reply: Mutex::new(Reply::Ok(PaymentVerification {
        success: true,
        message: None,
        status: Some("pending".to_string()),
        amount: None,
        transaction_id: None,
        gateway_response: serde_json::Value::Null,
      })),
      update_reply: Mutex::new(Reply::Ok(OrderMutationResult {
        success: true,
        message: None,
        order: None,
      })),
      payment_script: Mutex::new(VecDeque::from([Reply::Ok(None)])),
      payment_delay: Mutex::new(Duration::ZERO),
      order_delay: Mutex::new(Duration::ZERO),
      orders: Mutex::new(HashMap::from([(order.order_number.clone(), order)])),
      carts: Mutex::new(HashMap::new()),
      order_requests: Mutex::new(vec![]),
      session_requests: Mutex::new(vec![]),
      verify_requests: Mutex::new(vec![]),
      status_updates: Mutex::new(vec![]),
    }
  }
}

impl FakeBackend {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Scripts the payment reads as a sequence of statuses on the sample order.
  pub fn script_statuses(&self, statuses: &[&str]) {
    *self.payment_script.lock() = statuses
      .iter()
      .map(|s| Reply::Ok(Some(sample_payment(s, OrderStatus::Pending))))
      .collect();
  }

  pub fn script_payments(&self, replies: Vec<Reply<Option<Payment>>>) {
    *self.payment_script.lock() = replies.into();
  }

  pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
  }

  pub fn remote_calls(&self) -> usize {
    [
      &self.create_order_calls,
      &self.create_session_calls,
      &self.verify_calls,
      &self.payment_calls,
      &self.order_calls,
      &self.update_status_calls,
    ]
    .iter()
    .map(|c| c.load(Ordering::SeqCst))
    .sum()
  }

  fn next_payment(&self) -> Reply<Option<Payment>> {
    let mut script = self.payment_script.lock();
    if script.len() > 1 {
      script.pop_front().unwrap_or(Reply::Ok(None))
    } else {
      script.front().cloned().unwrap_or(Reply::Ok(None))
    }
  }
}

#[async_trait]
impl OrderService for FakeBackend {
  async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderMutationResult> {
    self.create_order_calls.fetch_add(1, Ordering::SeqCst);
    self.order_requests.lock().push(request);
    let delay = *self.order_delay.lock();
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    self.order_reply.lock().to_result()
  }

  async fn order(&self, order_number: &str) -> Result<Option<Order>> {
    self.order_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.orders.lock().get(order_number).cloned())
  }

  async fn update_order_status(&self, request: UpdateOrderStatusRequest) -> Result<OrderMutationResult> {
    self.update_status_calls.fetch_add(1, Ordering::SeqCst);
    self.status_updates.lock().push(request.clone());
    let reply = self.update_reply.lock().to_result();
    if matches!(reply, Ok(OrderMutationResult { success: true, .. })) {
      for order in self.orders.lock().values_mut() {
        if order.numeric_id() == Some(request.order_id) {
          order.status = request.status.clone();
        }
      }
    }
    reply
  }
}

#[async_trait]
impl PaymentGatewayClient for FakeBackend {
  async fn create_session(&self, request: PaymentSessionRequest, gateway_name: &str) -> Result<PaymentSession> {
    self.create_session_calls.fetch_add(1, Ordering::SeqCst);
    self.session_requests.lock().push((request, gateway_name.to_string()));
    self.session_reply.lock().to_result()
  }

  async fn verify(&self, request: VerifyPaymentRequest) -> Result<PaymentVerification> {
    self.verify_calls.fetch_add(1, Ordering::SeqCst);
    self.verify_requests.lock().push(request);
    self.verify_reply.lock().to_result()
  }

  async fn payment(&self, _payment_id: &str) -> Result<Option<Payment>> {
    self.payment_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *self.payment_delay.lock();
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    self.next_payment().to_result()
  }
}

#[async_trait]
impl CartService for FakeBackend {
  async fn cart(&self, session_key: &str) -> Result<Option<Cart>> {
    self.cart_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.carts.lock().get(session_key).cloned())
  }
}

// --- Sample data ---

pub const SESSION_KEY: &str = "cart_session_1700000000000_abc123xyz";

pub fn sample_order() -> Order {
  Order {
    id: "42".to_string(),
    order_number: "ORD-20240501-0042".to_string(),
    status: OrderStatus::Pending,
    subtotal: Some(dec!(100.00)),
    tax_amount: Some(dec!(5.00)),
    delivery_fee: Some(dec!(10.00)),
    total_amount: Some(dec!(115.00)),
    customer_name: Some("Mariam Khalid".to_string()),
    customer_email: Some("mariam@example.ae".to_string()),
    items: vec![OrderLineItem {
      product_name: "Single Origin Dark 70%".to_string(),
      quantity: 2,
      unit_price: dec!(50.00),
      total_price: dec!(100.00),
      product_sku: Some("DARK-70".to_string()),
    }],
    status_history: vec![],
  }
}

pub fn sample_payment(status: &str, order_status: OrderStatus) -> Payment {
  Payment {
    id: "9".to_string(),
    payment_id: "pay_abc".to_string(),
    status: PaymentStatus::from(status),
    amount: dec!(115.00),
    currency: "AED".to_string(),
    order: Some(PaymentOrderSummary {
      order_number: Some("ORD-20240501-0042".to_string()),
      status: order_status,
      customer_name: Some("Mariam Khalid".to_string()),
      total_amount: Some(dec!(115.00)),
    }),
    gateway: Some(PaymentGateway {
      name: "Ziina".to_string(),
    }),
    created_at: None,
    captured_at: None,
    gateway_transaction_id: None,
    gateway_response: serde_json::Value::Null,
  }
}

pub fn sample_cart() -> Cart {
  Cart {
    id: "3".to_string(),
    session_key: SESSION_KEY.to_string(),
    subtotal: dec!(100.00),
    tax_amount: dec!(5.00),
    total: dec!(105.00),
    item_count: 2,
    items: vec![CartItem {
      id: "11".to_string(),
      quantity: 2,
      product_name: "Single Origin Dark 70%".to_string(),
      display_name: None,
      product: None,
    }],
  }
}

pub fn empty_cart() -> Cart {
  Cart {
    items: vec![],
    item_count: 0,
    ..sample_cart()
  }
}

pub fn sample_form() -> CheckoutForm {
  serde_json::from_value(serde_json::json!({
    "fullName": "Mariam Khalid",
    "email": "mariam@example.ae",
    "phoneNumber": "+971501112233",
    "addressLine": "Apartment 804, Palm View Residence",
    "city": "Dubai",
    "emirate": "DUBAI"
  }))
  .unwrap()
}

pub fn fast_settings() -> CheckoutSettings {
  CheckoutSettings::default()
}

pub struct Harness {
  pub backend: Arc<FakeBackend>,
  pub store: Arc<MemorySessionStore>,
  pub session: SessionContext,
  pub coordinator: CheckoutCoordinator,
}

pub fn harness_with(settings: CheckoutSettings) -> Harness {
  let backend = FakeBackend::new();
  let store = Arc::new(MemorySessionStore::new());
  let session = SessionContext::new(store.clone(), SESSION_KEY);
  let coordinator = CheckoutCoordinator::new(backend.clone(), backend.clone(), session.clone(), settings);
  Harness {
    backend,
    store,
    session,
    coordinator,
  }
}

pub fn harness() -> Harness {
  harness_with(fast_settings())
}
