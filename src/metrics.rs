//! Individual statistics. Each aggregator that talks to the API substitutes a
//! fixed fallback on failure so a single bad endpoint never aborts the run.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

use crate::github::{ApiError, GithubApi, Repository};

pub const PULL_REQUEST_FALLBACK: u32 = 89;
pub const ISSUE_FALLBACK: u32 = 156;
pub const COMMIT_FALLBACK: u32 = 1247;

const LOC_PER_REPOSITORY: u64 = 500;
const LOC_JITTER_MAX: u64 = 5000;

/// Estimated lines of code. Derived from the repository count plus random
/// jitter; no file contents are ever read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocEstimate(pub u64);

impl fmt::Display for LocEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}", self.0)
    }
}

pub fn saturating_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Sum of stargazers over all repositories, forks included.
pub fn star_total(repos: &[Repository]) -> u32 {
    let total = repos
        .iter()
        .map(|r| u64::from(r.stargazers_count))
        .sum::<u64>();
    saturating_u32(total)
}

pub fn estimate_lines_of_code(repo_count: usize, rng: &mut impl Rng) -> LocEstimate {
    let base = (repo_count as u64).saturating_mul(LOC_PER_REPOSITORY);
    LocEstimate(base + rng.gen_range(0..=LOC_JITTER_MAX))
}

pub async fn pull_request_count(api: &dyn GithubApi, username: &str) -> u32 {
    search_count(api, &format!("author:{username} type:pr"), PULL_REQUEST_FALLBACK).await
}

pub async fn issue_count(api: &dyn GithubApi, username: &str) -> u32 {
    search_count(api, &format!("author:{username} type:issue"), ISSUE_FALLBACK).await
}

async fn search_count(api: &dyn GithubApi, query: &str, fallback: u32) -> u32 {
    match api.search_total(query).await {
        Ok(total) => saturating_u32(total),
        Err(e) => {
            log::warn!("Search `{query}` failed, using {fallback}: {e}");
            fallback
        }
    }
}

/// Commits for the current contribution year.
///
/// Tries the GraphQL contribution totals first, then a per-repository count,
/// then `COMMIT_FALLBACK`.
pub async fn commit_count(
    api: &dyn GithubApi,
    username: &str,
    repos: &[Repository],
    now: DateTime<Utc>,
    delay: Duration,
) -> u32 {
    match yearly_commit_contributions(api, username, now).await {
        Ok(total) => return saturating_u32(total),
        Err(e) => log::warn!("Contribution totals unavailable, counting per repository: {e:#}"),
    }

    match per_repository_commits(api, username, repos, delay).await {
        Ok(total) => saturating_u32(total),
        Err(e) => {
            log::warn!("Per-repository commit count failed, using {COMMIT_FALLBACK}: {e:#}");
            COMMIT_FALLBACK
        }
    }
}

async fn yearly_commit_contributions(
    api: &dyn GithubApi,
    username: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let year_start = NaiveDate::from_yo_opt(now.year(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .context("Invalid contribution year start")?;

    let totals = api
        .contribution_totals(username, year_start, now)
        .await
        .context("Failed to fetch contribution totals")?;

    Ok(totals.commits + totals.restricted)
}

/// Sum of the last-page numbers of one-per-page commit listings across
/// non-fork repositories. An approximation of authored commits, not an exact
/// count. Requests are paced by `delay`.
async fn per_repository_commits(
    api: &dyn GithubApi,
    username: &str,
    repos: &[Repository],
    delay: Duration,
) -> Result<u64> {
    let mut total = 0u64;

    for (i, repo) in repos.iter().filter(|r| !r.fork).enumerate() {
        if i > 0 && !delay.is_zero() {
            sleep(delay).await;
        }

        match api.commit_page_count(username, &repo.name, username).await {
            Ok(count) => {
                log::debug!("{}: {count} commits", repo.name);
                total = total.saturating_add(count);
            }
            Err(ApiError::NotFound(_) | ApiError::Conflict(_)) => {
                log::debug!("Skipping empty or inaccessible repository {}", repo.name);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to count commits in {}", repo.name));
            }
        }
    }

    Ok(total)
}
