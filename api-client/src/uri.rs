//! URI utilities.

use camino::Utf8Path;
use http::Uri;

/// Extension trait for URIs.
pub trait UriExtension {
    /// Join an endpoint path onto a base URI.
    ///
    /// Relative endpoints extend the base path, absolute endpoints replace it.
    /// Any query on the base is discarded.
    fn join<P: AsRef<str>>(self, path: P) -> Uri;
}

impl UriExtension for Uri {
    fn join<P: AsRef<str>>(self, path: P) -> Uri {
        let mut parts = self.into_parts();

        let base = parts
            .path_and_query
            .as_ref()
            .map(|pq| pq.path())
            .unwrap_or("/");
        let joined = Utf8Path::new(base).join(path.as_ref());
        let mut joined = joined.into_string();
        if !joined.starts_with('/') {
            joined.insert(0, '/');
        }

        parts.path_and_query = Some(
            http::uri::PathAndQuery::from_maybe_shared(joined)
                .expect("joined path is a valid URI path"),
        );
        Uri::from_parts(parts).expect("joined URI keeps a valid scheme and authority")
    }
}
