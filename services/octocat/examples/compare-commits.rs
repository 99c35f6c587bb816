use eyre::Context;
use octocat::GithubClient;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(owner), Some(repository), Some(base), Some(head)) =
        (args.next(), args.next(), args.next(), args.next())
    else {
        eyre::bail!("usage: compare-commits <owner> <repository> <base> <head>");
    };

    let token = std::env::var("GITHUB_PAT").context("GITHUB_PAT must be set")?;
    let client = GithubClient::new(token);

    let comparison = client
        .compare_commits(&owner, &repository, &base, &head)
        .await?;

    println!(
        "{} ({} ahead, {} behind) {}",
        comparison.status, comparison.ahead_by, comparison.behind_by, comparison.html_url
    );
    for commit in &comparison.commits {
        println!("{} {}", &commit.sha[..7.min(commit.sha.len())], commit.message());
    }

    Ok(())
}
