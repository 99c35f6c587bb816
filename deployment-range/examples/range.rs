use chrono::{DateTime, Duration, Utc};
use deployment_range::{DeploymentService, RepositoryConfig};
use eyre::Context;
use tracing_subscriber::EnvFilter;

fn timestamp(name: &str) -> eyre::Result<Option<DateTime<Utc>>> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(
            DateTime::parse_from_rfc3339(&value)
                .with_context(|| format!("{name} must be an RFC 3339 timestamp"))?
                .with_timezone(&Utc),
        )),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(error).context(name.to_owned()),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = RepositoryConfig::from_env()?;
    let to = timestamp("TO")?.unwrap_or_else(Utc::now);
    let from = timestamp("FROM")?.unwrap_or(to - Duration::days(7));

    tracing::info!(owner = %config.owner, repository = %config.repository, %from, %to, "Listing deployments");
    let mut service = DeploymentService::new(config.repository());
    let deployments = service.list_deployments_in_range(from, to).await?;

    println!("{}", serde_json::to_string_pretty(&deployments)?);
    Ok(())
}
