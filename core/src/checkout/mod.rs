// cacao_checkout/src/checkout/mod.rs

//! The checkout flow: submission, return-route verification and order auto-confirmation.

pub mod confirmation;
pub mod coordinator;
pub mod outcome;
pub mod return_flow;
pub mod settings;
pub mod state;
pub mod submission;
pub mod validation;

pub use coordinator::{CheckoutCoordinator, CheckoutPipelines};
pub use outcome::{interpret_payment, PaymentView, ViewAction};
pub use return_flow::{ConfirmationPhase, ReturnRoute, ReturnSnapshot, ReturnWatch};
pub use settings::{CheckoutSettings, PollPolicy, ZIINA_GATEWAY};
pub use state::CheckoutState;
pub use submission::CheckoutRedirect;
pub use validation::{CheckoutForm, PaymentMethod};
