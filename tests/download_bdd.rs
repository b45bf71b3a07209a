//! Behavioural tests for downloading review comments into CSV.
//!
//! Each scenario drives the real `reqwest` transport through the library
//! entry point against a mock GraphQL server, then inspects the CSV written
//! and the queries the server saw.

mod support;

use std::collections::BTreeMap;
use std::error::Error;

use camino::Utf8PathBuf;
use review_harvest::github::GraphQlClientConfig;
use review_harvest::{
    HarvestError, HarvestOptions, HarvestReport, PersonalAccessToken, QueryExecutor,
    RepositoryLocator, ReqwestTransport, download,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::Value;
use tempfile::TempDir;

use support::{
    GraphQlServer, pull_request_page, pull_request_page_request, review_comments,
    review_comments_request, schema_request, schema_response,
};

type StepResult = Result<(), Box<dyn Error>>;

/// `(number, review_count)` pairs listed on one page.
type PageListing = Vec<(u64, u64)>;

#[derive(ScenarioState, Default)]
struct DownloadState {
    server: Slot<GraphQlServer>,
    pages: Slot<Vec<PageListing>>,
    comments: Slot<Vec<(u64, String, String)>>,
    workspace: Slot<TempDir>,
    output: Slot<Utf8PathBuf>,
    report: Slot<HarvestReport>,
    error: Slot<HarvestError>,
}

#[fixture]
fn download_state() -> DownloadState {
    DownloadState::default()
}

fn trim_quotes(text: &str) -> &str {
    text.trim_matches('"')
}

fn with_server<R>(
    download_state: &DownloadState,
    action: impl FnOnce(&GraphQlServer) -> R,
) -> Result<R, Box<dyn Error>> {
    download_state
        .server
        .with_ref(action)
        .ok_or_else(|| "mock server not initialised".into())
}

#[given("a mock GitHub GraphQL server")]
fn start_server(download_state: &DownloadState) {
    download_state.server.set(GraphQlServer::start());
}

#[given("a mock GitHub GraphQL server that rejects the token")]
fn start_rejecting_server(download_state: &DownloadState) {
    let server = GraphQlServer::start();
    server.reject_all(401, "Bad credentials");
    download_state.server.set(server);
}

fn page_listing(
    download_state: &DownloadState,
    page: u64,
    add: impl FnOnce(&mut PageListing),
) -> StepResult {
    let index = usize::try_from(page)?
        .checked_sub(1)
        .ok_or("pages are numbered from 1")?;
    let mut pages = download_state.pages.take().unwrap_or_default();
    if pages.len() <= index {
        pages.resize_with(index + 1, Vec::new);
    }
    let listing = pages.get_mut(index).ok_or("page was just allocated")?;
    add(listing);
    download_state.pages.set(pages);
    Ok(())
}

#[given("page {page:u64} lists pull request {number:u64} with {reviews:u64} reviews")]
fn list_pull_request(
    download_state: &DownloadState,
    page: u64,
    number: u64,
    reviews: u64,
) -> StepResult {
    page_listing(download_state, page, |listing| listing.push((number, reviews)))
}

#[given("page {page:u64} lists no pull requests")]
fn list_nothing(download_state: &DownloadState, page: u64) -> StepResult {
    page_listing(download_state, page, |_| ())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("pull request {number:u64} has a comment on {path} saying {body}")]
fn add_comment(download_state: &DownloadState, number: u64, path: String, body: String) {
    let mut comments = download_state.comments.take().unwrap_or_default();
    comments.push((number, trim_quotes(&path).to_owned(), trim_quotes(&body).to_owned()));
    download_state.comments.set(comments);
}

/// Mounts the introspection answer, every configured page, and the comments
/// of every listed pull request.
fn mount_listing(download_state: &DownloadState) -> StepResult {
    let pages = download_state.pages.get().unwrap_or_default();
    let comments = download_state.comments.get().unwrap_or_default();

    let mut by_pull_request: BTreeMap<u64, Vec<(&str, &str)>> = BTreeMap::new();
    for listing in &pages {
        for (number, _) in listing {
            by_pull_request.entry(*number).or_default();
        }
    }
    for (number, path, body) in &comments {
        by_pull_request
            .entry(*number)
            .or_default()
            .push((path.as_str(), body.as_str()));
    }

    with_server(download_state, |server| {
        server.serve(schema_request(), schema_response());
        for (index, listing) in pages.iter().enumerate() {
            let cursor = if index == 0 { String::new() } else { format!("c{index}") };
            let next = (index + 1 < pages.len()).then(|| format!("c{}", index + 1));
            server.serve(
                pull_request_page_request(&cursor),
                pull_request_page(listing, next.as_deref()),
            );
        }
        for (number, rows) in &by_pull_request {
            server.serve(review_comments_request(*number), review_comments(rows));
        }
    })
}

fn run_download(download_state: &DownloadState, options: &HarvestOptions) -> StepResult {
    mount_listing(download_state)?;

    let workspace = TempDir::new()?;
    let output = Utf8PathBuf::from_path_buf(workspace.path().join("octocat-hello-world.csv"))
        .map_err(|path| format!("non UTF-8 temp path: {}", path.display()))?;
    let endpoint = with_server(download_state, GraphQlServer::endpoint)?;
    let token = PersonalAccessToken::new("test-token")?;
    let transport = ReqwestTransport::new(token, &GraphQlClientConfig::new(endpoint, 0))?;
    let executor = QueryExecutor::new(transport);
    let locator = RepositoryLocator::new("octocat", "hello-world")?;

    match download(&executor, &locator, &output, options) {
        Ok(report) => {
            drop(download_state.error.take());
            download_state.report.set(report);
        }
        Err(error) => {
            drop(download_state.report.take());
            download_state.error.set(error);
        }
    }
    download_state.output.set(output);
    download_state.workspace.set(workspace);
    Ok(())
}

#[when("the review comments are downloaded")]
fn download_everything(download_state: &DownloadState) -> StepResult {
    run_download(download_state, &HarvestOptions::default())
}

#[when("at most {max:u64} review comments are downloaded")]
fn download_capped(download_state: &DownloadState, max: u64) -> StepResult {
    let options = HarvestOptions {
        max_rows: Some(max),
        ..HarvestOptions::default()
    };
    run_download(download_state, &options)
}

fn written_rows(download_state: &DownloadState) -> Result<Vec<(String, String)>, Box<dyn Error>> {
    let output = download_state.output.get().ok_or("no download was run")?;
    let mut reader = review_harvest::rows::csv_reader(std::fs::File::open(output)?);
    let mut rows = Vec::new();
    for record in reader.records() {
        let fields = record?;
        let path = fields.get(0).ok_or("row has no path")?.to_owned();
        let body = fields.get(1).ok_or("row has no body")?.to_owned();
        rows.push((path, body));
    }
    Ok(rows)
}

fn download_error(download_state: &DownloadState) -> Result<HarvestError, Box<dyn Error>> {
    download_state
        .error
        .get()
        .ok_or_else(|| "expected the download to fail".into())
}

#[then("the download succeeds with {rows:u64} rows")]
fn assert_rows_written(download_state: &DownloadState, rows: u64) -> StepResult {
    if let Some(error) = download_state.error.get() {
        return Err(format!("download failed: {error}").into());
    }
    let report = download_state.report.get().ok_or("no download report")?;
    if report.rows_written != rows {
        return Err(format!("expected {rows} rows, report says {}", report.rows_written).into());
    }
    let on_disk = written_rows(download_state)?.len();
    if u64::try_from(on_disk)? != rows {
        return Err(format!("expected {rows} rows, file holds {on_disk}").into());
    }
    Ok(())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("row {row:u64} of the output is {path} saying {body}")]
fn assert_row(download_state: &DownloadState, row: u64, path: String, body: String) -> StepResult {
    let index = usize::try_from(row)?
        .checked_sub(1)
        .ok_or("rows are numbered from 1")?;
    let rows = written_rows(download_state)?;
    let (actual_path, actual_body) = rows.get(index).ok_or_else(|| format!("no row {row}"))?;
    if actual_path != trim_quotes(&path) || actual_body != trim_quotes(&body) {
        return Err(format!("row {row} is ({actual_path}, {actual_body})").into());
    }
    Ok(())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("every written path ends with {suffix}")]
fn assert_paths_filtered(download_state: &DownloadState, suffix: String) -> StepResult {
    let expected = trim_quotes(&suffix);
    let rows = written_rows(download_state)?;
    if let Some((path, _)) = rows.iter().find(|(path, _)| !path.ends_with(expected)) {
        return Err(format!("{path} does not end with {expected}").into());
    }
    Ok(())
}

#[then("the pull request pages were fetched {count:u64} times")]
fn assert_page_fetches(download_state: &DownloadState, count: u64) -> StepResult {
    let fetched = with_server(download_state, |server| {
        server.received_variables("GetPullRequests").len()
    })?;
    if u64::try_from(fetched)? != count {
        return Err(format!("expected {count} page fetches, server saw {fetched}").into());
    }
    Ok(())
}

#[then("the report counts {count:u64} queried pull requests")]
fn assert_pull_requests_queried(download_state: &DownloadState, count: u64) -> StepResult {
    let report = download_state.report.get().ok_or("no download report")?;
    if report.pull_requests_queried != count {
        return Err(format!(
            "expected {count} queried pull requests, report says {}",
            report.pull_requests_queried
        )
        .into());
    }
    Ok(())
}

#[then("pull request {number:u64} was never queried")]
fn assert_not_queried(download_state: &DownloadState, number: u64) -> StepResult {
    let queried = with_server(download_state, |server| {
        server
            .received_variables("GetPullRequestReviewComments")
            .iter()
            .any(|variables| variables.get("prNumber").and_then(Value::as_u64) == Some(number))
    })?;
    if queried {
        return Err(format!("pull request {number} was queried").into());
    }
    Ok(())
}

#[then("the output file is empty")]
fn assert_output_empty(download_state: &DownloadState) -> StepResult {
    let output = download_state.output.get().ok_or("no download was run")?;
    let contents = std::fs::read_to_string(output)?;
    if !contents.is_empty() {
        return Err(format!("expected an empty file, got: {contents}").into());
    }
    Ok(())
}

#[then("the download fails with an authentication error")]
fn assert_authentication_error(download_state: &DownloadState) -> StepResult {
    match download_error(download_state)? {
        HarvestError::Authentication { message } if message.contains("Bad credentials") => Ok(()),
        other => Err(format!("expected Authentication naming the rejection, got {other:?}").into()),
    }
}

#[then("the download fails with an API error")]
fn assert_api_error(download_state: &DownloadState) -> StepResult {
    match download_error(download_state)? {
        HarvestError::Api { .. } => Ok(()),
        other => Err(format!("expected Api, got {other:?}").into()),
    }
}

#[scenario(path = "tests/features/download.feature", index = 0)]
fn download_walks_every_page(download_state: DownloadState) {
    let _ = download_state;
}

#[scenario(path = "tests/features/download.feature", index = 1)]
fn download_stops_at_row_cap(download_state: DownloadState) {
    let _ = download_state;
}

#[scenario(path = "tests/features/download.feature", index = 2)]
fn download_of_empty_repository(download_state: DownloadState) {
    let _ = download_state;
}

#[scenario(path = "tests/features/download.feature", index = 3)]
fn download_with_rejected_token(download_state: DownloadState) {
    let _ = download_state;
}

#[scenario(path = "tests/features/download.feature", index = 4)]
fn download_with_unanswered_listing(download_state: DownloadState) {
    let _ = download_state;
}
