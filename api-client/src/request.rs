use http::{header::HeaderValue, HeaderMap, HeaderName, Uri};
use serde::Serialize;

use crate::{error::Error, response::Response, ApiClient, Authentication};

/// Extension methods on `http::Request`.
pub trait RequestExt {
    /// Clone the request line and headers, leaving the body behind.
    fn parts(&self) -> http::request::Parts;
}

impl<B> RequestExt for http::Request<B> {
    fn parts(&self) -> http::request::Parts {
        let mut builder = http::request::Request::builder()
            .uri(self.uri().clone())
            .method(self.method().clone())
            .version(self.version());

        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers().clone();
        }

        let (parts, _) = builder
            .body(())
            .expect("request line was already valid")
            .into_parts();
        parts
    }
}

/// Builder for a single request against an [ApiClient].
#[derive(Debug)]
pub struct RequestBuilder<A> {
    client: ApiClient<A>,
    method: http::Method,
    uri: Uri,
    headers: HeaderMap,
    query: Option<String>,
    body: Option<hyperdriver::Body>,
    error: Option<Error>,
}

impl<A> RequestBuilder<A> {
    /// Start a request against `uri`.
    pub fn new(client: ApiClient<A>, uri: Uri, method: http::Method) -> Self {
        Self {
            client,
            method,
            uri,
            headers: HeaderMap::new(),
            query: None,
            body: None,
            error: None,
        }
    }

    /// Add a header to the request.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let name = HeaderName::try_from(key).map_err(Into::<http::Error>::into);
        let value = HeaderValue::try_from(value).map_err(Into::<http::Error>::into);
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            (Err(error), _) | (_, Err(error)) => {
                self.error.get_or_insert(Error::Build(error));
            }
        }
        self
    }

    /// Append URL-encoded query parameters to the request.
    ///
    /// Repeated calls add to the query string rather than replacing it.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        match serde_urlencoded::to_string(query) {
            Ok(encoded) if encoded.is_empty() => {}
            Ok(encoded) => match self.query.as_mut() {
                Some(existing) => {
                    existing.push('&');
                    existing.push_str(&encoded);
                }
                None => self.query = Some(encoded),
            },
            Err(error) => {
                self.error.get_or_insert(Error::Query(error));
            }
        }
        self
    }

    /// Set the request body.
    pub fn body<B: Into<hyperdriver::Body>>(self, body: B) -> Self {
        Self {
            body: Some(body.into()),
            ..self
        }
    }

    /// Assemble the `http::Request` without sending it.
    pub fn build(self) -> Result<http::Request<hyperdriver::Body>, Error> {
        self.into_parts().map(|(_, request)| request)
    }

    fn into_parts(self) -> Result<(ApiClient<A>, http::Request<hyperdriver::Body>), Error> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri = match self.query {
            Some(query) => with_query(&self.uri, &query)?,
            None => self.uri,
        };

        let mut request = http::Request::builder()
            .method(self.method)
            .uri(uri)
            .body(self.body.unwrap_or_else(hyperdriver::Body::empty))?;
        *request.headers_mut() = self.headers;

        Ok((self.client, request))
    }

    /// Send the request, returning the response regardless of its status.
    pub async fn send(self) -> Result<Response, Error>
    where
        A: Authentication,
    {
        let (client, request) = self.into_parts()?;
        client.execute(request).await
    }
}

fn with_query(uri: &Uri, query: &str) -> Result<Uri, Error> {
    let mut parts = uri.clone().into_parts();
    let path = parts
        .path_and_query
        .as_ref()
        .map(|pq| pq.path())
        .unwrap_or("/");
    let combined = match uri.query() {
        Some(existing) if !existing.is_empty() => format!("{path}?{existing}&{query}"),
        _ => format!("{path}?{query}"),
    };
    parts.path_and_query = Some(
        combined
            .parse()
            .map_err(|error: http::uri::InvalidUri| Error::Build(error.into()))?,
    );
    Uri::from_parts(parts).map_err(|error| Error::Build(error.into()))
}
