//! A [`PaymentLinkSource`] that reads payment links from a remote service over HTTP.
//!
//! [`PaymentLinkClient`] issues `GET {base}/api/payment-links/{id}` and
//! deserializes the JSON body into a [`PaymentLink`].
//!
//! ## Features
//!
//! - Uses `reqwest` for async HTTP requests
//! - Supports optional timeout and headers
//! - Integrates with `tracing` if the `telemetry` feature is enabled
//!
//! ## Error Handling
//!
//! Custom error types capture detailed failure contexts, including
//! - URL construction
//! - HTTP transport failures
//! - JSON deserialization errors
//! - Unexpected HTTP status responses

use http::{HeaderMap, StatusCode};
use paylink::{PaymentId, PaymentLink};
use reqwest::Client;
use std::fmt::Display;
use std::time::Duration;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::resolver::{BoxFuture, NotFoundReason, PaymentLinkSource};

/// A client for the payment-link service.
#[derive(Clone, Debug)]
pub struct PaymentLinkClient {
    /// Base URL of the service (e.g. `https://pay.example/`)
    base_url: Url,
    /// Collection URL, `./api/payment-links/` relative to the base
    links_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Optional custom headers sent with each request
    headers: HeaderMap,
    /// Optional request timeout
    timeout: Option<Duration>,
}

/// Errors that can occur while fetching a payment link.
#[derive(Debug, thiserror::Error)]
pub enum PaymentLinkClientError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("Base URL cannot be a base: {0}")]
    CannotBeABase(Url),
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// Failed to read response body.
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl PaymentLinkClientError {
    /// Classifies the failure for diagnostics; payers only ever see "not found".
    #[must_use]
    pub fn not_found_reason(&self) -> NotFoundReason {
        match self {
            Self::HttpStatus { status, .. }
                if *status == StatusCode::NOT_FOUND || *status == StatusCode::GONE =>
            {
                NotFoundReason::Missing
            }
            Self::JsonDeserialization { .. } => NotFoundReason::Invalid,
            Self::UrlParse { .. }
            | Self::CannotBeABase(_)
            | Self::Http { .. }
            | Self::HttpStatus { .. }
            | Self::ResponseBodyRead { .. } => NotFoundReason::Unavailable,
        }
    }
}

impl PaymentLinkClient {
    /// Path of the payment-link collection, relative to the base URL.
    pub const LINKS_PATH: &'static str = "./api/payment-links/";

    /// Returns the base URL used by this client.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns any custom headers configured on the client.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the configured timeout, if any.
    pub const fn timeout(&self) -> &Option<Duration> {
        &self.timeout
    }

    /// Constructs a new [`PaymentLinkClient`] from a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentLinkClientError`] if URL construction fails.
    pub fn try_new(base_url: Url) -> Result<Self, PaymentLinkClientError> {
        if base_url.cannot_be_a_base() {
            return Err(PaymentLinkClientError::CannotBeABase(base_url));
        }
        let links_url =
            base_url
                .join(Self::LINKS_PATH)
                .map_err(|e| PaymentLinkClientError::UrlParse {
                    context: "Failed to construct ./api/payment-links/ URL",
                    source: e,
                })?;
        Ok(Self {
            base_url,
            links_url,
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: None,
        })
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the URL of a single payment link, with the id as one
    /// percent-encoded path segment.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentLinkClientError::CannotBeABase`] for opaque base URLs.
    pub fn link_url(&self, id: &PaymentId) -> Result<Url, PaymentLinkClientError> {
        let mut url = self.links_url.clone();
        url.path_segments_mut()
            .map_err(|()| PaymentLinkClientError::CannotBeABase(self.links_url.clone()))?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }

    /// Sends a `GET /api/payment-links/{id}` request.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentLinkClientError`] if the request fails, the service
    /// answers with a non-success status, or the body is not a payment link.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paylink.client.fetch", skip_all, fields(payment_id = %id), err)
    )]
    pub async fn fetch(&self, id: &PaymentId) -> Result<PaymentLink, PaymentLinkClientError> {
        let url = self.link_url(id)?;
        self.get_json(url, "GET /api/payment-links/{id}").await
    }

    /// Generic GET helper that handles error mapping, timeout application, and
    /// telemetry integration.
    ///
    /// `context` is a human-readable identifier used in tracing and error messages.
    async fn get_json<R>(&self, url: Url, context: &'static str) -> Result<R, PaymentLinkClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        let mut req = self.client.get(url);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| PaymentLinkClientError::Http { context, source: e })?;

        let result = if http_response.status().is_success() {
            http_response
                .json::<R>()
                .await
                .map_err(|e| PaymentLinkClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| PaymentLinkClientError::ResponseBodyRead { context, source: e })?;
            Err(PaymentLinkClientError::HttpStatus {
                context,
                status,
                body,
            })
        };

        record_result_on_span(&result);

        result
    }
}

impl PaymentLinkSource for PaymentLinkClient {
    type Error = PaymentLinkClientError;

    fn fetch_link<'a>(
        &'a self,
        id: &'a PaymentId,
    ) -> BoxFuture<'a, Result<PaymentLink, Self::Error>> {
        Box::pin(self.fetch(id))
    }

    fn classify(error: &Self::Error) -> NotFoundReason {
        error.not_found_reason()
    }
}

/// Converts a string URL into a `PaymentLinkClient`, parsing the URL and calling `try_new`.
impl TryFrom<&str> for PaymentLinkClient {
    type Error = PaymentLinkClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Normalize: strip trailing slashes and add a single trailing slash
        let mut normalized = value.trim_end_matches('/').to_string();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| PaymentLinkClientError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        Self::try_new(url)
    }
}

/// Converts a String URL into a `PaymentLinkClient`.
impl TryFrom<String> for PaymentLinkClient {
    type Error = PaymentLinkClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::WARN, error = %err, "Request to payment-link service failed");
        }
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn link_body(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "amount": 25,
            "acceptedChains": ["solana", "ethereum"],
            "preferredReceiveChain": "solana",
            "merchantWallets": { "solana": "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU" }
        })
    }

    fn id(s: &str) -> PaymentId {
        PaymentId::new(s).unwrap()
    }

    #[test]
    fn test_link_url_normalizes_base() {
        let client = PaymentLinkClient::try_from("https://pay.example/app//").unwrap();
        assert_eq!(client.base_url().as_str(), "https://pay.example/app/");
        assert_eq!(
            client.link_url(&id("pay_123")).unwrap().as_str(),
            "https://pay.example/app/api/payment-links/pay_123"
        );
    }

    #[test]
    fn test_link_url_encodes_id_as_one_segment() {
        let client = PaymentLinkClient::try_from("https://pay.example").unwrap();
        assert_eq!(
            client.link_url(&id("a/b c")).unwrap().as_str(),
            "https://pay.example/api/payment-links/a%2Fb%20c"
        );
    }

    #[test]
    fn test_rejects_opaque_base() {
        let url: Url = "mailto:merchant@pay.example".parse().unwrap();
        assert!(matches!(
            PaymentLinkClient::try_new(url),
            Err(PaymentLinkClientError::CannotBeABase(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_deserializes_link() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/payment-links/pay_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(link_body("pay_123")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = PaymentLinkClient::try_from(mock_server.uri()).unwrap();
        let link = client.fetch(&id("pay_123")).await.unwrap();
        assert_eq!(link.id.as_str(), "pay_123");
        assert_eq!(link.display_amount(), "$25 USDC");
    }

    #[tokio::test]
    async fn test_fetch_sends_custom_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/payment-links/pay_123"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(link_body("pay_123")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().unwrap());
        let client = PaymentLinkClient::try_from(mock_server.uri())
            .unwrap()
            .with_headers(headers)
            .with_timeout(Duration::from_secs(5));
        assert!(client.fetch(&id("pay_123")).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_404_is_missing() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/payment-links/nonexistent"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&mock_server)
            .await;

        let client = PaymentLinkClient::try_from(mock_server.uri()).unwrap();
        let err = client.fetch(&id("nonexistent")).await.unwrap_err();
        match &err {
            PaymentLinkClientError::HttpStatus { status, body, .. } => {
                assert_eq!(*status, StatusCode::NOT_FOUND);
                assert_eq!(body, "not found");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.not_found_reason(), NotFoundReason::Missing);
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = PaymentLinkClient::try_from(mock_server.uri()).unwrap();
        let err = client.fetch(&id("pay_123")).await.unwrap_err();
        assert_eq!(err.not_found_reason(), NotFoundReason::Unavailable);
    }

    #[tokio::test]
    async fn test_fetch_bad_json_is_invalid() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "pay_123" })))
            .mount(&mock_server)
            .await;

        let client = PaymentLinkClient::try_from(mock_server.uri()).unwrap();
        let err = client.fetch(&id("pay_123")).await.unwrap_err();
        assert!(matches!(err, PaymentLinkClientError::JsonDeserialization { .. }));
        assert_eq!(err.not_found_reason(), NotFoundReason::Invalid);
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(link_body("pay_123"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = PaymentLinkClient::try_from(mock_server.uri())
            .unwrap()
            .with_timeout(Duration::from_millis(50));
        let err = client.fetch(&id("pay_123")).await.unwrap_err();
        assert!(matches!(err, PaymentLinkClientError::Http { .. }));
        assert_eq!(err.not_found_reason(), NotFoundReason::Unavailable);
    }
}
