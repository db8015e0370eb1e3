//! HTTP request/response tracing middleware.

use axum::body::Body;
use axum::http::Request;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, Span};

/// Query parameters whose values never reach the logs.
const REDACTED_PARAMS: &[&str] = &["api_key", "apikey"];

type MakeRequestSpan = fn(&Request<Body>) -> Span;

/// Creates a tracing middleware for HTTP requests.
///
/// # Logging Behavior
///
/// Every request gets an `INFO` span with method, path, query and version. API
/// keys passed in the query string (single-step shortening) are masked. The
/// response is logged inside the span with status and latency in milliseconds.
///
/// # Example Logs
///
/// ```text
/// INFO request{method=GET path=/rest/short-urls/shorten query=api_key=***&long_url=https://example.com version=HTTP/1.1}: finished processing request latency=4 ms status=200
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeRequestSpan> {
    TraceLayer::new_for_http()
        .make_span_with(make_span as MakeRequestSpan)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    let query = request.uri().query().map(redact_query).unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        query = %query,
        version = ?request.version(),
    )
}

/// Replaces the value of every sensitive parameter with `***`.
fn redact_query(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _))
                if REDACTED_PARAMS
                    .iter()
                    .any(|p| p.eq_ignore_ascii_case(name)) =>
            {
                format!("{name}=***")
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_masked() {
        assert_eq!(
            redact_query("api_key=secret123&long_url=https://example.com"),
            "api_key=***&long_url=https://example.com"
        );
        assert_eq!(redact_query("apiKey=secret"), "apiKey=***");
    }

    #[test]
    fn test_other_params_untouched() {
        assert_eq!(
            redact_query("page=2&search_term=foo&flag"),
            "page=2&search_term=foo&flag"
        );
    }
}
