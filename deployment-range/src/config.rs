//! Where deployments are read from.

use api_client::Secret;
use octocat::GithubClient;
use serde::Deserialize;
use thiserror::Error;

use crate::repository::GithubRepository;

/// Environment variable naming the repository owner.
pub const OWNER_VAR: &str = "OWNER";

/// Environment variable naming the repository.
pub const REPOSITORY_VAR: &str = "REPOSITORY";

/// Environment variable naming the deployment environment (optional).
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// Environment variable holding the Github token.
pub const TOKEN_VAR: &str = "GITHUB_PAT";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable was not set, or was empty.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A variable was set to something other than unicode text.
    #[error("setting {0} is not valid unicode")]
    NotUnicode(&'static str),
}

/// The repository, environment and credentials to read deployments with.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub repository: String,

    /// Only consider deployments to this environment.
    #[serde(default)]
    pub environment: Option<String>,

    /// Github token.
    pub token: Secret,
}

impl RepositoryConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(()),
        })
    }

    /// Read configuration through `lookup`, which returns `Err` for values
    /// which aren't unicode.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<Option<String>, ()>,
    {
        let optional = |name: &'static str| {
            lookup(name)
                .map(|value| value.filter(|v| !v.is_empty()))
                .map_err(|_| ConfigError::NotUnicode(name))
        };
        let required =
            |name: &'static str| optional(name)?.ok_or(ConfigError::Missing(name));

        Ok(Self {
            owner: required(OWNER_VAR)?,
            repository: required(REPOSITORY_VAR)?,
            environment: optional(ENVIRONMENT_VAR)?,
            token: required(TOKEN_VAR)?.into(),
        })
    }

    /// A Github client authenticated with the configured token.
    pub fn client(&self) -> GithubClient {
        GithubClient::new(self.token.clone())
    }

    /// The configured repository, read through `client`.
    pub fn repository_with(&self, client: GithubClient) -> GithubRepository {
        let repository = GithubRepository::new(client, &self.owner, &self.repository);
        match &self.environment {
            Some(environment) => repository.with_environment(environment),
            None => repository,
        }
    }

    /// The configured repository.
    pub fn repository(&self) -> GithubRepository {
        self.repository_with(self.client())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        vars: &[(&'static str, &'static str)],
    ) -> impl Fn(&'static str) -> Result<Option<String>, ()> {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        move |name| Ok(vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn reads_all_settings() {
        let config = RepositoryConfig::from_lookup(lookup(&[
            ("OWNER", "octo"),
            ("REPOSITORY", "app"),
            ("ENVIRONMENT", "production"),
            ("GITHUB_PAT", "ghp_secret"),
        ]))
        .unwrap();

        assert_eq!(config.owner, "octo");
        assert_eq!(config.repository, "app");
        assert_eq!(config.environment.as_deref(), Some("production"));
        assert_eq!(config.token.revealed(), "ghp_secret");
        assert!(!format!("{config:?}").contains("ghp_secret"));
    }

    #[test]
    fn environment_is_optional() {
        let config = RepositoryConfig::from_lookup(lookup(&[
            ("OWNER", "octo"),
            ("REPOSITORY", "app"),
            ("ENVIRONMENT", ""),
            ("GITHUB_PAT", "ghp_secret"),
        ]))
        .unwrap();
        assert_eq!(config.environment, None);
    }

    #[test]
    fn missing_token() {
        let error =
            RepositoryConfig::from_lookup(lookup(&[("OWNER", "octo"), ("REPOSITORY", "app")]))
                .unwrap_err();
        assert!(matches!(error, ConfigError::Missing("GITHUB_PAT")));
    }

    #[test]
    fn not_unicode() {
        let error = RepositoryConfig::from_lookup(|name| {
            if name == "REPOSITORY" {
                Err(())
            } else {
                Ok(Some("x".to_owned()))
            }
        })
        .unwrap_err();
        assert!(matches!(error, ConfigError::NotUnicode("REPOSITORY")));
    }

    #[test]
    fn deserialize_from_json() {
        let config: RepositoryConfig = serde_json::from_value(serde_json::json!({
            "owner": "octo",
            "repository": "app",
            "token": "ghp_secret"
        }))
        .unwrap();
        assert_eq!(config.environment, None);

        let repository = config.repository_with(octocat::GithubClient::with_service(
            "https://api.github.com/".parse().unwrap(),
            config.token.clone(),
            api_client::mock::MockService::new(),
        ));
        assert_eq!(repository.owner(), "octo");
        assert_eq!(repository.environment(), None);
    }
}
