//! Shared mock GitHub GraphQL server for integration tests.

use serde_json::{Value, json};
use tokio::runtime::Runtime;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wiremock server driven from a dedicated Tokio runtime so blocking
/// clients can call it from the test thread.
pub struct GraphQlServer {
    server: MockServer,
    runtime: Runtime,
}

impl GraphQlServer {
    /// Starts a fresh server.
    ///
    /// # Panics
    ///
    /// Panics if the Tokio runtime cannot be created.
    pub fn start() -> Self {
        let runtime = Runtime::new()
            .unwrap_or_else(|error| panic!("failed to create Tokio runtime: {error}"));
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    /// GraphQL endpoint URL served by this server.
    pub fn endpoint(&self) -> String {
        format!("{}/graphql", self.server.uri())
    }

    /// Answers requests whose body contains `request` with `response`,
    /// expecting exactly `times` matches.
    pub fn respond(&self, request: Value, response: Value, times: u64) {
        let mock = Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(request))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .expect(times);
        self.runtime.block_on(mock.mount(&self.server));
    }

    /// Answers requests whose body contains `request` with `response`, as
    /// often as asked.
    pub fn serve(&self, request: Value, response: Value) {
        let mock = Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(request))
            .respond_with(ResponseTemplate::new(200).set_body_json(response));
        self.runtime.block_on(mock.mount(&self.server));
    }

    /// Answers every request with `status` and a GitHub-style error message.
    ///
    /// Mount this first: it takes precedence over mocks mounted later.
    pub fn reject_all(&self, status: u16, message: &str) {
        let mock = Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "message": message })));
        self.runtime.block_on(mock.mount(&self.server));
    }

    /// Variables of every received request for `operation`, in arrival order.
    pub fn received_variables(&self, operation: &str) -> Vec<Value> {
        self.received_bodies()
            .into_iter()
            .filter(|body| body.get("operationName").and_then(Value::as_str) == Some(operation))
            .filter_map(|mut body| body.get_mut("variables").map(Value::take))
            .collect()
    }

    fn received_bodies(&self) -> Vec<Value> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .filter_map(|request| request.body_json::<Value>().ok())
            .collect()
    }

    /// Operation names of every request received, in arrival order.
    pub fn received_operations(&self) -> Vec<String> {
        self.received_bodies()
            .iter()
            .filter_map(|body| body.get("operationName").and_then(Value::as_str).map(ToOwned::to_owned))
            .collect()
    }

    /// Panics if any mounted expectation was not met.
    pub fn verify(&self) {
        self.runtime.block_on(self.server.verify());
    }
}

fn rate_limit() -> Value {
    json!({ "limit": 5000, "cost": 1, "remaining": 4999 })
}

/// Introspection response naming a handful of types.
pub fn schema_response() -> Value {
    json!({
        "data": {
            "__schema": {
                "queryType": { "name": "Query" },
                "types": [{ "name": "Query" }, { "name": "PullRequest" }, { "name": "Repository" }]
            },
            "rateLimit": rate_limit()
        }
    })
}

/// One page of `(number, review_count)` pull requests.
pub fn pull_request_page(pull_requests: &[(u64, u64)], next_cursor: Option<&str>) -> Value {
    let nodes: Vec<Value> = pull_requests
        .iter()
        .map(|(number, reviews)| json!({ "number": number, "reviews": { "totalCount": reviews } }))
        .collect();
    json!({
        "data": {
            "repository": {
                "pullRequests": {
                    "nodes": nodes,
                    "pageInfo": { "endCursor": next_cursor, "hasNextPage": next_cursor.is_some() }
                }
            },
            "rateLimit": rate_limit()
        }
    })
}

/// Review comments of one pull request, all in a single review.
pub fn review_comments(comments: &[(&str, &str)]) -> Value {
    let nodes: Vec<Value> = comments
        .iter()
        .enumerate()
        .map(|(index, (path, body))| json!({ "id": format!("PRRC_{index}"), "path": path, "body": body }))
        .collect();
    json!({
        "data": {
            "repository": {
                "pullRequest": {
                    "reviews": {
                        "totalCount": 1,
                        "nodes": [{ "id": "PRR_0", "comments": { "totalCount": nodes.len(), "nodes": nodes } }]
                    }
                }
            },
            "rateLimit": rate_limit()
        }
    })
}

/// Request body fragment selecting the pull request page after `cursor`.
pub fn pull_request_page_request(cursor: &str) -> Value {
    json!({ "operationName": "GetPullRequests", "variables": { "after": cursor } })
}

/// Request body fragment selecting the comments of pull request `number`.
pub fn review_comments_request(number: u64) -> Value {
    json!({ "operationName": "GetPullRequestReviewComments", "variables": { "prNumber": number } })
}

/// Request body fragment selecting the introspection query.
pub fn schema_request() -> Value {
    json!({ "operationName": "DiscoverSchema" })
}
