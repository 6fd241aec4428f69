// cacao_checkout/src/flow/mod.rs

//! Building blocks shared by every step pipeline: the lockable flow data wrapper,
//! the step control signals, step definitions and the handler type.

pub mod control;
pub mod data;
pub mod handler;
pub mod step;

pub use control::{FlowOutcome, StepControl};
pub use data::FlowData;
pub use handler::Handler;
pub use step::StepDef;
