// cacao_checkout/src/pipeline/mod.rs

//! The `Pipeline<TData, Err>` type: named steps with before/on/after handlers,
//! run in order against one shared `FlowData<TData>`.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Pipeline;
