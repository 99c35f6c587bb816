//! Shared plumbing for small HTTP API clients.
//!
//! An [ApiClient] pairs a base URI with an [Authentication] method and a
//! shared `hyperdriver` client service. Individual service crates wrap one
//! and describe their endpoints and models on top of it.

use std::sync::Arc;

use http::Method;
use http::Uri;
use hyperdriver::service::SharedService;
use tower::ServiceExt;

mod authentication;
pub mod error;
mod paginate;
pub mod request;
pub mod response;
mod secret;
pub mod uri;

pub use self::authentication::{Authentication, BearerAuth};
pub use self::error::{Error, HttpResponseError};
pub use self::paginate::{next_page, ListOptions, Page, RateLimit};
pub use self::request::{RequestBuilder, RequestExt};
pub use self::response::Response;
pub use self::secret::Secret;
use self::uri::UriExtension as _;

/// A client for accessing APIs over HTTP / HTTPS
///
/// Useful inner object to wrap for individual API clients.
#[derive(Debug)]
pub struct ApiClient<A> {
    base: Arc<Uri>,
    inner: hyperdriver::client::SharedClientService<hyperdriver::Body, hyperdriver::Body>,
    authentication: Arc<A>,
}

impl<A> Clone for ApiClient<A> {
    fn clone(&self) -> Self {
        Self {
            base: Arc::clone(&self.base),
            inner: self.inner.clone(),
            authentication: Arc::clone(&self.authentication),
        }
    }
}

impl<A> ApiClient<A>
where
    A: Authentication + Send + Sync + 'static,
{
    /// Create a new API Client from a base URL and an authentication method
    pub fn new(base: Uri, authentication: A) -> Self {
        let inner = hyperdriver::Client::build_tcp_http()
            .with_default_tls()
            .build_service();

        ApiClient {
            base: Arc::new(base),
            inner,
            authentication: Arc::new(authentication),
        }
    }

    /// Create a new API Client which sends requests through `inner`.
    ///
    /// This is how service crates install their own middleware (default
    /// headers, timeouts), and how tests substitute a [mock::MockService].
    pub fn new_with_inner_service<S>(base: Uri, authentication: A, inner: S) -> Self
    where
        S: tower::Service<
                http::Request<hyperdriver::Body>,
                Response = http::Response<hyperdriver::Body>,
                Error = hyperdriver::client::Error,
            > + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let service = tower::ServiceBuilder::new()
            .layer(SharedService::layer())
            .service(inner);

        ApiClient {
            base: Arc::new(base),
            inner: service,
            authentication: Arc::new(authentication),
        }
    }
}

impl<A> ApiClient<A> {
    fn endpoint(&self, endpoint: &str) -> Uri {
        (*self.base).clone().join(endpoint)
    }

    /// Build a GET request against an endpoint.
    pub fn get(&self, endpoint: &str) -> RequestBuilder<A> {
        RequestBuilder::new(self.clone(), self.endpoint(endpoint), Method::GET)
    }
}

impl<A> ApiClient<A>
where
    A: Authentication,
{
    /// Authenticate and send a request.
    pub async fn execute(&self, req: http::Request<hyperdriver::Body>) -> Result<Response, Error> {
        let req = self.authentication.authenticate(req);
        let parts = req.parts();

        tracing::trace!(method = %parts.method, uri = %parts.uri, "sending request");
        let response = self.inner.clone().oneshot(req).await?;
        Ok(Response::new(parts, response))
    }
}

pub mod mock {
    //! A canned-response service for testing API clients without a network.

    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// A response returned by [MockService].
    #[derive(Debug, Clone)]
    pub struct MockResponse {
        status: http::StatusCode,
        headers: http::HeaderMap,
        body: Vec<u8>,
    }

    impl MockResponse {
        /// Create a canned response.
        pub fn new(status: http::StatusCode, headers: http::HeaderMap, body: Vec<u8>) -> Self {
            Self {
                status,
                headers,
                body,
            }
        }
    }

    /// A service which answers requests from a table of canned responses.
    ///
    /// Responses are matched on path and query first, then on path alone.
    /// Requests matching neither get an empty `404 Not Found`.
    /// Every request URI is recorded and available from [MockService::requests].
    #[derive(Debug, Default, Clone)]
    pub struct MockService {
        responses: HashMap<String, MockResponse>,
        requests: Arc<Mutex<Vec<http::Uri>>>,
    }

    impl MockService {
        /// An empty mock service.
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond to `path` (optionally including a query) with a canned response.
        pub fn add(
            &mut self,
            path: &str,
            status: http::StatusCode,
            headers: http::HeaderMap,
            body: Vec<u8>,
        ) {
            let response = MockResponse::new(status, headers, body);
            self.responses.insert(path.to_owned(), response);
        }

        /// Respond to `path` with a `200 OK` JSON body.
        pub fn add_json(&mut self, path: &str, headers: http::HeaderMap, body: serde_json::Value) {
            let mut headers = headers;
            headers.insert(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("application/json"),
            );
            self.add(path, http::StatusCode::OK, headers, body.to_string().into_bytes());
        }

        /// URIs of every request seen so far.
        pub fn requests(&self) -> Vec<http::Uri> {
            self.requests.lock().clone()
        }
    }

    impl tower::Service<http::Request<hyperdriver::Body>> for MockService {
        type Response = http::Response<hyperdriver::Body>;
        type Error = hyperdriver::client::Error;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(
            &mut self,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<hyperdriver::Body>) -> Self::Future {
            self.requests.lock().push(req.uri().clone());

            let path = req.uri().path();
            let path_and_query = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(path);

            let canned = self
                .responses
                .get(path_and_query)
                .or_else(|| self.responses.get(path));

            let response = match canned {
                Some(canned) => {
                    let mut response = http::Response::new(hyperdriver::Body::from(
                        Bytes::from(canned.body.clone()),
                    ));
                    *response.status_mut() = canned.status;
                    response.headers_mut().extend(canned.headers.clone());
                    response
                }
                None => {
                    tracing::warn!(path = path_and_query, "No response configured");
                    let mut response = http::Response::new(hyperdriver::Body::empty());
                    *response.status_mut() = http::StatusCode::NOT_FOUND;
                    response
                }
            };

            std::future::ready(Ok(response))
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn extensions_produce_send_futures() {
        let client = ApiClient::new_bearer_auth_for_test();
        let builder = client.get("frobulator");

        fn assert_send<T: Send>(_t: T) {}

        let fut = builder.send();
        assert_send(fut);
    }

    impl ApiClient<BearerAuth> {
        fn new_bearer_auth_for_test() -> Self {
            ApiClient::new_with_inner_service(
                "http://httpbin.org/get/".parse().unwrap(),
                BearerAuth::new(Secret::from("secret garden")),
                crate::mock::MockService::new(),
            )
        }
    }

    #[tokio::test]
    async fn mock_client_authenticates_and_records() {
        let mut mock = crate::mock::MockService::new();
        mock.add_json(
            "/get/status",
            http::HeaderMap::new(),
            serde_json::json!({"ok": true}),
        );

        let client = ApiClient::new_with_inner_service(
            "http://httpbin.org/get/".parse().unwrap(),
            BearerAuth::new(Secret::from("secret garden")),
            mock.clone(),
        );

        let response = client.get("status").send().await.unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(
            response
                .request()
                .headers
                .get(http::header::AUTHORIZATION)
                .unwrap(),
            "Bearer secret garden"
        );

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn error_for_status_keeps_message() {
        let mut mock = crate::mock::MockService::new();
        mock.add(
            "/missing",
            http::StatusCode::NOT_FOUND,
            http::HeaderMap::new(),
            b"Not Found".to_vec(),
        );

        let client =
            ApiClient::new_with_inner_service("http://example.com/".parse().unwrap(), (), mock);
        let error = client
            .get("missing")
            .send()
            .await
            .unwrap()
            .error_for_status()
            .await
            .unwrap_err();

        assert_eq!(error.status, http::StatusCode::NOT_FOUND);
        assert_eq!(error.message, "Not Found");
    }

    #[tokio::test]
    async fn unconfigured_paths_are_not_found() {
        let mock = crate::mock::MockService::new();
        let client = ApiClient::new_with_inner_service(
            "http://example.com/".parse().unwrap(),
            (),
            mock.clone(),
        );

        let response = client.get("nowhere").send().await.unwrap();
        assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(response.text().await.unwrap(), "");
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path(), "/nowhere");
    }
}
