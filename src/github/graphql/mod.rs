//! GraphQL query execution against the GitHub API.
//!
//! [`QueryExecutor`] sends one query per call through a [`GraphQlTransport`],
//! unwraps the GraphQL envelope, decodes the typed `data` body and reports the
//! `rateLimit` block that every query in this crate selects. The transport is
//! a trait so the pagination logic can be driven by a mock in tests while
//! [`ReqwestTransport`] performs real HTTP requests.

use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::HarvestError;
use super::rate_limit::RateLimitReport;

mod transport;

pub use transport::{GraphQlClientConfig, ReqwestTransport};

/// Default GitHub GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

const RATE_LIMIT_FIELD: &str = "rateLimit";
const RATE_LIMITED_ERROR_TYPE: &str = "RATE_LIMITED";

const DISCOVER_SCHEMA: Query = Query::new(
    "DiscoverSchema",
    r"
    query DiscoverSchema {
      __schema {
        queryType { name }
        types { name }
      }
      rateLimit { limit cost remaining }
    }
    ",
);

/// A named GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    operation_name: &'static str,
    document: &'static str,
}

impl Query {
    /// Creates a query from its operation name and document text.
    #[must_use]
    pub const fn new(operation_name: &'static str, document: &'static str) -> Self {
        Self {
            operation_name,
            document,
        }
    }

    /// Operation name used in logs and in the request body.
    #[must_use]
    pub const fn operation_name(&self) -> &'static str {
        self.operation_name
    }
}

/// JSON body posted to the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    /// Query document.
    pub query: String,
    /// Bound variables.
    pub variables: Value,
    /// Operation to run within the document.
    pub operation_name: String,
}

/// Sends a GraphQL request and returns the raw response envelope.
#[cfg_attr(test, mockall::automock)]
pub trait GraphQlTransport {
    /// Posts one request, returning the decoded JSON response body.
    ///
    /// # Errors
    ///
    /// Returns transport, authentication, or HTTP status failures.
    fn post(&self, request: &GraphQlRequest) -> Result<Value, HarvestError>;
}

/// Decoded `data` body together with the rate limit usage of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse<D> {
    /// Typed `data` body, minus the `rateLimit` selection.
    pub data: D,
    /// Quota usage charged for the query.
    pub rate_limit: RateLimitReport,
}

/// Summary of the remote schema fetched on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSchema {
    query_type: String,
    type_names: Vec<String>,
}

impl RemoteSchema {
    /// Name of the root query type.
    #[must_use]
    pub const fn query_type(&self) -> &str {
        self.query_type.as_str()
    }

    /// Number of named types the endpoint exposes.
    #[must_use]
    pub const fn type_count(&self) -> usize {
        self.type_names.len()
    }

    /// Returns true if the schema declares a type with the given name.
    #[must_use]
    pub fn has_type(&self, name: &str) -> bool {
        self.type_names.iter().any(|type_name| type_name == name)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaData {
    #[serde(rename = "__schema")]
    schema: ApiSchema,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSchema {
    query_type: ApiNamedType,
    types: Vec<ApiNamedType>,
}

#[derive(Debug, Deserialize)]
struct ApiNamedType {
    name: String,
}

/// Runs typed queries through a transport, one request per call.
pub struct QueryExecutor<T> {
    transport: T,
    discover_schema: bool,
    schema: OnceLock<RemoteSchema>,
}

impl<T: GraphQlTransport> QueryExecutor<T> {
    /// Creates an executor that discovers the remote schema on first use.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            discover_schema: true,
            schema: OnceLock::new(),
        }
    }

    /// Enables or disables schema discovery before the first query.
    #[must_use]
    pub const fn with_schema_discovery(mut self, enabled: bool) -> Self {
        self.discover_schema = enabled;
        self
    }

    /// Returns the remote schema, fetching it on the first call.
    ///
    /// # Errors
    ///
    /// Returns the failure of the introspection query.
    pub fn schema(&self) -> Result<&RemoteSchema, HarvestError> {
        if let Some(schema) = self.schema.get() {
            return Ok(schema);
        }

        let response: QueryResponse<SchemaData> = self.run(&DISCOVER_SCHEMA, &Value::Null)?;
        let api = response.data.schema;
        let discovered = RemoteSchema {
            query_type: api.query_type.name,
            type_names: api.types.into_iter().map(|named| named.name).collect(),
        };
        tracing::debug!(
            query_type = discovered.query_type(),
            types = discovered.type_count(),
            "discovered remote schema"
        );
        Ok(self.schema.get_or_init(|| discovered))
    }

    /// Sends exactly one query and decodes its `data` body.
    ///
    /// When schema discovery is enabled and has not yet happened, the
    /// introspection query is sent first.
    ///
    /// # Errors
    ///
    /// Returns transport errors from the [`GraphQlTransport`],
    /// [`HarvestError::GraphQl`] or [`HarvestError::RateLimitExceeded`] when
    /// the endpoint reports query errors, and
    /// [`HarvestError::UnexpectedResponse`] when the body does not match `D`.
    pub fn execute<V, D>(&self, query: &Query, variables: &V) -> Result<QueryResponse<D>, HarvestError>
    where
        V: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        if self.discover_schema {
            self.schema()?;
        }
        self.run(query, variables)
    }

    fn run<V, D>(&self, query: &Query, variables: &V) -> Result<QueryResponse<D>, HarvestError>
    where
        V: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        let request = GraphQlRequest {
            query: query.document.to_owned(),
            variables: serde_json::to_value(variables).map_err(|error| {
                HarvestError::Configuration {
                    message: format!(
                        "{} variables could not be encoded: {error}",
                        query.operation_name
                    ),
                }
            })?,
            operation_name: query.operation_name.to_owned(),
        };

        tracing::debug!(operation = query.operation_name, "sending GraphQL query");
        let body = self.transport.post(&request)?;
        let response = decode_response(query.operation_name, body)?;

        tracing::info!("{}", response.rate_limit);
        if response.rate_limit.is_exhausted() {
            tracing::warn!(
                operation = query.operation_name,
                "GraphQL rate limit exhausted; further queries will be refused"
            );
        }
        Ok(response)
    }
}

fn decode_response<D: DeserializeOwned>(
    operation: &str,
    body: Value,
) -> Result<QueryResponse<D>, HarvestError> {
    let envelope: GraphQlEnvelope =
        serde_json::from_value(body).map_err(|error| HarvestError::UnexpectedResponse {
            message: format!("{operation} response is not a GraphQL envelope: {error}"),
        })?;

    if !envelope.errors.is_empty() {
        return Err(map_graphql_errors(operation, &envelope.errors));
    }

    let mut data = envelope
        .data
        .ok_or_else(|| HarvestError::UnexpectedResponse {
            message: format!("{operation} response has no data"),
        })?;

    let rate_limit_value = data
        .as_object_mut()
        .and_then(|fields| fields.remove(RATE_LIMIT_FIELD))
        .ok_or_else(|| HarvestError::UnexpectedResponse {
            message: format!("{operation} response has no rateLimit"),
        })?;
    let rate_limit: RateLimitReport =
        serde_json::from_value(rate_limit_value).map_err(|error| {
            HarvestError::UnexpectedResponse {
                message: format!("{operation} rateLimit is malformed: {error}"),
            }
        })?;

    let decoded = serde_json::from_value(data).map_err(|error| HarvestError::UnexpectedResponse {
        message: format!("{operation} data is malformed: {error}"),
    })?;

    Ok(QueryResponse {
        data: decoded,
        rate_limit,
    })
}

fn map_graphql_errors(operation: &str, errors: &[GraphQlError]) -> HarvestError {
    let message = errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    let rate_limited = errors
        .iter()
        .any(|error| error.kind.as_deref() == Some(RATE_LIMITED_ERROR_TYPE));

    if rate_limited {
        HarvestError::RateLimitExceeded {
            message: format!("{operation}: {message}"),
        }
    } else {
        HarvestError::GraphQl {
            message: format!("{operation}: {message}"),
        }
    }
}
