// cacao_checkout/src/graphql/mod.rs

//! HTTP/JSON GraphQL boundary. Remote failures are classified into `CheckoutError`
//! here and nowhere else.

pub mod backend;
pub mod client;
pub mod documents;

pub use backend::GraphQlBackend;
pub use client::{classify_graphql_errors, GraphQlClient, GraphQlErrorEntry};
