// cacao_checkout/src/graphql/client.rs

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, instrument};

use crate::error::{CheckoutError, Result};

pub const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphQlErrorEntry {
  pub message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
  data: Option<T>,
  #[serde(default)]
  errors: Vec<GraphQlErrorEntry>,
}

/// Turns a GraphQL `errors` array into one typed error.
///
/// Any message mentioning "authorized" marks the whole response as an authorization
/// failure; otherwise the messages are joined into a service error.
pub fn classify_graphql_errors(errors: &[GraphQlErrorEntry]) -> CheckoutError {
  let joined = errors
    .iter()
    .map(|e| e.message.as_str())
    .collect::<Vec<_>>()
    .join("; ");
  if errors.iter().any(|e| e.message.contains("authorized")) {
    CheckoutError::Authorization(joined)
  } else {
    CheckoutError::Service(joined)
  }
}

/// POSTs `{operationName, query, variables}` to one endpoint.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
  http: reqwest::Client,
  endpoint: String,
  csrf_token: Option<String>,
  bearer: Option<String>,
}

impl GraphQlClient {
  pub fn new(endpoint: impl Into<String>) -> Self {
    Self::with_http_client(reqwest::Client::new(), endpoint)
  }

  pub fn with_http_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
    Self {
      http,
      endpoint: endpoint.into(),
      csrf_token: None,
      bearer: None,
    }
  }

  pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
    self.csrf_token = token.filter(|t| !t.trim().is_empty());
    self
  }

  /// A copy of this client that sends `Authorization: Bearer <token>`.
  pub fn with_bearer(&self, token: Option<String>) -> Self {
    Self {
      bearer: token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
      ..self.clone()
    }
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  pub fn has_bearer(&self) -> bool {
    self.bearer.is_some()
  }

  #[instrument(
    name = "graphql::execute",
    skip(self, document, variables),
    fields(endpoint = %self.endpoint, authenticated = self.bearer.is_some()),
    err(Display)
  )]
  pub async fn execute<T: DeserializeOwned>(&self, operation_name: &str, document: &str, variables: Value) -> Result<T> {
    let body = json!({
      "operationName": operation_name,
      "query": document,
      "variables": variables,
    });

    let mut request = self.http.post(&self.endpoint).json(&body);
    if let Some(token) = &self.bearer {
      request = request.bearer_auth(token);
    }
    if let Some(csrf) = &self.csrf_token {
      request = request.header(CSRF_HEADER, csrf);
    }

    let response = request.send().await.map_err(|e| {
      error!(error = %e, "GraphQL transport failure.");
      CheckoutError::Network(e.to_string())
    })?;
    let status = response.status();
    let raw = response.text().await.map_err(|e| {
      error!(error = %e, %status, "Failed to read GraphQL response body.");
      CheckoutError::Network(e.to_string())
    })?;
    debug!(%status, bytes = raw.len(), "GraphQL response received.");

    decode_response(status, &raw)
  }
}

fn decode_response<T: DeserializeOwned>(status: reqwest::StatusCode, raw: &str) -> Result<T> {
  let parsed: GraphQlResponse<T> = match serde_json::from_str(raw) {
    Ok(parsed) => parsed,
    Err(e) if status.is_success() => {
      return Err(CheckoutError::Service(format!("Malformed GraphQL response: {}", e)));
    }
    Err(_) => {
      error!(%status, "GraphQL endpoint answered with a non-GraphQL error.");
      return Err(CheckoutError::Network(format!("HTTP {}", status)));
    }
  };

  if !parsed.errors.is_empty() {
    return Err(classify_graphql_errors(&parsed.errors));
  }
  parsed
    .data
    .ok_or_else(|| CheckoutError::Service("GraphQL response contained no data".to_string()))
}
