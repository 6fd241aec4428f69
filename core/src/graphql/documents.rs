// cacao_checkout/src/graphql/documents.rs

pub const CREATE_RETAIL_ORDER: &str = r#"
mutation CreateRetailOrder($sessionKey: String!, $customerInfo: CustomerInput!, $shippingAddress: AddressInput!) {
  createRetailOrder(sessionKey: $sessionKey, customerInfo: $customerInfo, shippingAddress: $shippingAddress) {
    success
    message
    order {
      id
      orderNumber
      status
      subtotal
      taxAmount
      deliveryFee
      totalAmount
      items { productName quantity unitPrice totalPrice productSku }
    }
  }
}
"#;

pub const GET_ORDER: &str = r#"
query GetOrder($orderNumber: String!) {
  order(orderNumber: $orderNumber) {
    id
    orderNumber
    status
    customerName
    customerEmail
    subtotal
    taxAmount
    deliveryFee
    totalAmount
    items { productName quantity unitPrice totalPrice productSku }
    statusHistory { status notes createdAt }
  }
}
"#;

pub const UPDATE_ORDER_STATUS: &str = r#"
mutation UpdateOrderStatus($input: UpdateOrderStatusInput!) {
  updateOrderStatus(input: $input) {
    success
    message
    order {
      id
      orderNumber
      status
      statusHistory { status notes createdAt }
    }
  }
}
"#;

pub const CREATE_PAYMENT_SESSION: &str = r#"
mutation CreatePaymentSession($input: PaymentSessionInput!, $gatewayName: String!) {
  createPaymentSession(input: $input, gatewayName: $gatewayName) {
    success
    message
    paymentUrl
    paymentId
    expiresAt
    gatewayResponse
  }
}
"#;

pub const VERIFY_PAYMENT: &str = r#"
mutation VerifyPayment($input: PaymentVerificationInput!) {
  verifyPayment(input: $input) {
    success
    message
    status
    amount
    transactionId
    gatewayResponse
  }
}
"#;

pub const GET_PAYMENT: &str = r#"
query GetPayment($paymentId: String!) {
  payment(paymentId: $paymentId) {
    id
    paymentId
    status
    amount
    currency
    order { orderNumber status customerName totalAmount }
    gateway { name }
    createdAt
    capturedAt
    gatewayTransactionId
    gatewayResponse
  }
}
"#;

pub const GET_CART: &str = r#"
query GetCart($sessionKey: String!) {
  cart(sessionKey: $sessionKey) {
    id
    sessionKey
    subtotal
    taxAmount
    total
    itemCount
    items {
      id
      quantity
      productName
      displayName
      product { sku }
    }
  }
}
"#;
