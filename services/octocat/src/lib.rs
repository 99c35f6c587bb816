//! Simple client for the deployment and commit APIs of Github.
//!
//! Requests are authenticated with a bearer token (a personal access token or
//! an installation token obtained elsewhere).

use api_client::{ApiClient, BearerAuth, ListOptions, Page, Secret};

use http::header;
use http::HeaderValue;
use hyperdriver::client::conn::transport::tcp::TcpTransportConfig;
use hyperdriver::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub mod models;

use crate::models::{
    CommitComparison, Deployment, DeploymentId, DeploymentStatus, DeploymentsQuery,
};

const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_API_VERSION_HEADER: &str = "x-github-api-version";
const GITHUB_BASE: &str = "https://api.github.com/";

/// Errors that can occur when using the Github client.
#[derive(Debug, Error)]
pub enum Error {
    /// An error that occurs when building or sending a request.
    #[error("Sending request: {0}")]
    Api(#[from] api_client::Error),

    /// A response not in the 200-299 range.
    #[error("Response: {0}")]
    Response(#[from] api_client::HttpResponseError),

    /// An error that occurs when serializing or deserializing a model.
    #[error("Model: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// The HTTP status of an unsuccessful response, if that is what this error is.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Error::Response(response) => Some(response.status),
            _ => None,
        }
    }
}

/// A Github client that can be used to make requests against the Github API.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: ApiClient<BearerAuth>,
}

impl GithubClient {
    /// Create a client for api.github.com which authenticates with `token`.
    pub fn new<T: Into<Secret>>(token: T) -> Self {
        let mut tcp = TcpTransportConfig::default();
        tcp.connect_timeout = Some(CONNECT_TIMEOUT);

        let client = Client::builder()
            .layer(
                tower_http::set_header::SetRequestHeaderLayer::if_not_present(
                    header::ACCEPT,
                    HeaderValue::from_static(GITHUB_ACCEPT),
                ),
            )
            .layer(
                tower_http::set_header::SetRequestHeaderLayer::if_not_present(
                    header::HeaderName::from_static(GITHUB_API_VERSION_HEADER),
                    HeaderValue::from_static(GITHUB_API_VERSION),
                ),
            )
            .with_tcp(tcp)
            .with_auto_http()
            .with_user_agent(format!("octocat/{}", env!("CARGO_PKG_VERSION")))
            .with_timeout(TIMEOUT)
            .build_service();

        Self::with_service(
            GITHUB_BASE.parse().expect("Github API base is a valid URI"),
            token,
            client,
        )
    }

    /// Create a client which sends requests to `base` through `service`.
    ///
    /// Useful for Github Enterprise hosts, or for tests with a mock service.
    pub fn with_service<T, S>(base: http::Uri, token: T, service: S) -> Self
    where
        T: Into<Secret>,
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
        Self {
            client: ApiClient::new_with_inner_service(base, BearerAuth::new(token), service),
        }
    }

    /// Build a GET request against a Github endpoint.
    pub fn get(&self, endpoint: &str) -> api_client::RequestBuilder<BearerAuth> {
        self.client.get(endpoint)
    }

    async fn fetch<T, Q>(
        &self,
        endpoint: &str,
        query: Option<&Q>,
    ) -> Result<(T, http::HeaderMap), Error>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let mut request = self.get(endpoint);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?.error_for_status().await?;
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(api_client::Error::ResponseBody)?;
        let value = serde_json::from_slice(&body)?;
        Ok((value, headers))
    }

    async fn fetch_page<T, Q>(&self, endpoint: &str, query: &Q) -> Result<Page<T>, Error>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let (items, headers) = self.fetch::<Vec<T>, Q>(endpoint, Some(query)).await?;
        let page = Page::from_headers(items, &headers);
        if let Some(rate) = &page.rate {
            tracing::trace!(remaining = rate.remaining, reset = %rate.reset, "Github rate limit");
        }
        Ok(page)
    }

    /// List one page of deployments for a repository, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_deployments(
        &self,
        owner: &str,
        repository: &str,
        query: &DeploymentsQuery,
    ) -> Result<Page<Deployment>, Error> {
        let page: Page<Deployment> = self
            .fetch_page(&format!("repos/{owner}/{repository}/deployments"), query)
            .await?;
        tracing::debug!(
            count = page.items.len(),
            next = ?page.next,
            "Listed deployments"
        );
        Ok(page)
    }

    /// List one page of statuses for a deployment, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_deployment_statuses(
        &self,
        owner: &str,
        repository: &str,
        id: DeploymentId,
        options: &ListOptions,
    ) -> Result<Page<DeploymentStatus>, Error> {
        self.fetch_page(
            &format!("repos/{owner}/{repository}/deployments/{id}/statuses"),
            options,
        )
        .await
    }

    /// Compare two commits, listing the commits in `head` which are not in `base`.
    #[tracing::instrument(skip(self))]
    pub async fn compare_commits(
        &self,
        owner: &str,
        repository: &str,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison, Error> {
        let (comparison, _) = self
            .fetch::<CommitComparison, ()>(
                &format!("repos/{owner}/{repository}/compare/{base}...{head}"),
                None,
            )
            .await?;
        Ok(comparison)
    }
}
