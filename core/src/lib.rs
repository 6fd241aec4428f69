// cacao_checkout/src/lib.rs

//! Checkout and payment confirmation for the Cacao storefront.
//!
//! The crate drives one shopper's checkout against a remote GraphQL backend:
//!  - Submission: validate the shipping form, create the order, open a Ziina payment
//!    session, remember the payment id and hand back the gateway URL.
//!  - Return routes: verify the payment once per mount, poll it on the success route,
//!    and auto-confirm the order the first time the payment reads as successful.
//!
//! Multi-step work runs through a small step-pipeline engine (`Pipeline<TData, Err>`)
//! with before/on/after handlers over shared `FlowData<TData>`.

/*
    Typical wiring:
    1. Build a `GraphQlClient` for the backend endpoint and wrap it in `GraphQlBackend`.
    2. Bind a `SessionContext` to the shopper's cart session key.
    3. Create a `CheckoutCoordinator` with the backend (as OrderService and
       PaymentGatewayClient), the session and `CheckoutSettings`.
    4. `submit(cart, form, method)` returns a `CheckoutRedirect`.
    5. When the gateway sends the shopper back, `mount_return(route, payment_id)` returns
       a `ReturnWatch`; read `snapshot()` as often as needed and `unmount()` when done.
*/

pub mod checkout;
pub mod error;
pub mod flow;
pub mod graphql;
pub mod model;
pub mod pipeline;
pub mod ports;
pub mod session;

pub use crate::checkout::{
  CheckoutCoordinator, CheckoutForm, CheckoutRedirect, CheckoutSettings, CheckoutState, PaymentMethod, PaymentView,
  PollPolicy, ReturnRoute, ReturnSnapshot, ReturnWatch,
};
pub use crate::error::{CheckoutError, FlowError, FlowResult, Result};
pub use crate::flow::{FlowData, FlowOutcome, Handler, StepControl, StepDef};
pub use crate::graphql::{GraphQlBackend, GraphQlClient};
pub use crate::pipeline::Pipeline;
pub use crate::ports::{CartService, OrderService, PaymentGatewayClient};
pub use crate::session::{FileSessionStore, MemorySessionStore, SessionContext, SessionStore};
