//! Authentication for API clients.
//!
//! The `Authentication` trait is applied by the `ApiClient` to every request
//! just before it is sent. Two implementations are provided:
//! - `BearerAuth` for Bearer token authentication
//! - `()` for no authentication

use http::HeaderValue;

use crate::Secret;

/// Trait to represent authenticating with an API queried via the `ApiClient`.
pub trait Authentication: Clone {
    /// Called by the `ApiClient` to implement authorization.
    fn authenticate<B>(&self, req: http::Request<B>) -> http::Request<B>;
}

/// Authentication with a bearer token, often used with a personal access token.
///
/// The token is stored as a [Secret] to prevent it from being logged.
///
/// # Example
/// ```rust
/// use api_client::BearerAuth;
///
/// let auth = BearerAuth::new("my-secret");
/// let header = auth.header_value();
///
/// assert_eq!(header.to_str().unwrap(), "Bearer my-secret");
/// ```
#[derive(Debug, Clone)]
pub struct BearerAuth(Secret);

impl BearerAuth {
    /// Create a new Bearer authentication with a given token.
    pub fn new<K: Into<Secret>>(key: K) -> Self {
        BearerAuth(key.into())
    }

    /// Get the header value for the Bearer token.
    pub fn header_value(&self) -> HeaderValue {
        self.0
            .bearer()
            .expect("bearer token is a valid HTTP header value")
    }
}

impl Authentication for BearerAuth {
    fn authenticate<B>(&self, mut req: http::Request<B>) -> http::Request<B> {
        if !req.headers().contains_key(http::header::AUTHORIZATION) {
            req.headers_mut()
                .append(http::header::AUTHORIZATION, self.header_value());
        } else {
            tracing::warn!("{} header already set", http::header::AUTHORIZATION);
        }
        req
    }
}

impl Authentication for () {
    fn authenticate<B>(&self, req: http::Request<B>) -> http::Request<B> {
        req
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_does_not_replace_existing_header() {
        let req = http::Request::builder()
            .header(http::header::AUTHORIZATION, "token other")
            .body(())
            .unwrap();

        let req = BearerAuth::new("mine").authenticate(req);
        let values: Vec<_> = req
            .headers()
            .get_all(http::header::AUTHORIZATION)
            .iter()
            .collect();
        assert_eq!(values, vec!["token other"]);
    }
}
