use anyhow::{Context, Result};

use crate::github::{GithubApi, PAGE_SIZE, Repository};

/// Fetch every repository owned by `username`.
///
/// Pages are requested until one comes back short. A page of exactly
/// `PAGE_SIZE` items always triggers another request, so totals that are an
/// exact multiple of the page size are not truncated.
pub async fn collect_repositories(api: &dyn GithubApi, username: &str) -> Result<Vec<Repository>> {
    let mut repos = Vec::new();
    let mut page = 1u32;

    loop {
        let batch = api
            .repositories_page(username, page, PAGE_SIZE)
            .await
            .with_context(|| format!("Failed to list repositories page {page} for {username}"))?;

        let full = batch.len() == PAGE_SIZE;
        repos.extend(batch);

        if !full {
            break;
        }
        page += 1;
    }

    log::info!("Collected {} repositories for {username}", repos.len());
    Ok(repos)
}
