// cacao_checkout/src/flow/handler.rs

use crate::flow::control::StepControl;
use crate::flow::data::FlowData;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every registered handler.
pub type HandlerFuture<Err> = Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>>;

/// A pipeline step handler.
///
/// Takes a clone of the pipeline's `FlowData<TData>` and resolves to a `StepControl`.
/// Handlers lock the data, copy out what they need, drop the guard and only then await
/// remote calls.
pub type Handler<TData, Err> = Box<dyn Fn(FlowData<TData>) -> HandlerFuture<Err> + Send + Sync>;
