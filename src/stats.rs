use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::age::membership_duration;
use crate::collector::collect_repositories;
use crate::github::GithubApi;
use crate::metrics::{self, LocEstimate};
use crate::streak::current_streak;

const NOT_SPECIFIED: &str = "Not specified";
const NO_BIO: &str = "No bio provided";

/// Everything the renderers show. Built once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileStats {
    pub name: String,
    pub username: String,
    pub location: String,
    pub bio: String,
    pub company: String,
    pub blog: String,
    pub member_for: String,
    pub repositories: u32,
    pub followers: u32,
    pub following: u32,
    pub commits: u32,
    pub pull_requests: u32,
    pub issues: u32,
    pub stars: u32,
    pub streak: u32,
    pub lines_of_code: LocEstimate,
}

#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions {
    /// Streak reported when neither the calendar nor the event feed answers.
    pub streak_fallback: u32,
    /// Pause between per-repository commit requests.
    pub commit_delay: Duration,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            streak_fallback: 0,
            commit_delay: Duration::from_millis(100),
        }
    }
}

fn text_or(value: Option<String>, fallback: &str) -> String {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Gather all statistics for `username`.
///
/// The profile and repository list are required; every other figure falls
/// back to a fixed value on failure.
pub async fn assemble(
    api: &dyn GithubApi,
    username: &str,
    now: DateTime<Utc>,
    options: AssembleOptions,
) -> Result<ProfileStats> {
    let profile = api
        .user_profile(username)
        .await
        .with_context(|| format!("Failed to fetch profile for {username}"))?;

    let repos = collect_repositories(api, username).await?;

    let commits =
        metrics::commit_count(api, username, &repos, now, options.commit_delay).await;

    let (pull_requests, issues, streak) = tokio::join!(
        metrics::pull_request_count(api, username),
        metrics::issue_count(api, username),
        current_streak(api, username, now, options.streak_fallback),
    );

    let stars = metrics::star_total(&repos);
    let lines_of_code = metrics::estimate_lines_of_code(repos.len(), &mut rand::thread_rng());

    let member_for = profile
        .created_at
        .map(|joined| membership_duration(joined.date_naive(), now.date_naive()))
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());

    let stats = ProfileStats {
        name: text_or(profile.name, &profile.login),
        username: profile.login,
        location: text_or(profile.location, NOT_SPECIFIED),
        bio: text_or(profile.bio, NO_BIO),
        company: text_or(profile.company, NOT_SPECIFIED),
        blog: text_or(profile.blog, NOT_SPECIFIED),
        member_for,
        repositories: metrics::saturating_u32(repos.len() as u64),
        followers: profile.followers,
        following: profile.following,
        commits,
        pull_requests,
        issues,
        stars,
        streak,
        lines_of_code,
    };

    log::info!(
        "Assembled stats for {}: {} repos, {} stars, {} commits, {}-day streak",
        stats.username,
        stats.repositories,
        stats.stars,
        stats.commits,
        stats.streak
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PULL_REQUEST_FALLBACK;
    use crate::test_utils::{FakeApi, fork, profile, repo};
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()
    }

    fn options() -> AssembleOptions {
        AssembleOptions {
            streak_fallback: 0,
            commit_delay: std::time::Duration::ZERO,
        }
    }

    fn populated() -> FakeApi {
        let today = now().date_naive();
        FakeApi::new()
            .with_profile(profile("octo"))
            .with_repos(vec![repo("a", 3), repo("b", 0), fork("c", 7)])
            .with_search("author:octo type:pr", 21)
            .with_search("author:octo type:issue", 8)
            .with_totals(400, 20)
            .with_calendar(&[
                (today, 1),
                (today - ChronoDuration::days(1), 5),
                (today - ChronoDuration::days(3), 2),
            ])
    }

    #[tokio::test]
    async fn test_assemble_populated() {
        let api = populated();
        let stats = assemble(&api, "octo", now(), options()).await.unwrap();

        assert_eq!(stats.username, "octo");
        assert_eq!(stats.name, "Octo Cat");
        assert_eq!(stats.location, "Lisbon");
        assert_eq!(stats.bio, NO_BIO);
        assert_eq!(stats.blog, NOT_SPECIFIED);
        assert_eq!(stats.member_for, "11 years, 7 months, 16 days");
        assert_eq!(stats.repositories, 3);
        assert_eq!(stats.stars, 10);
        assert_eq!(stats.followers, 12);
        assert_eq!(stats.following, 3);
        assert_eq!(stats.commits, 420);
        assert_eq!(stats.pull_requests, 21);
        assert_eq!(stats.issues, 8);
        assert_eq!(stats.streak, 2);
        assert!((1500..=6500).contains(&stats.lines_of_code.0));
    }

    #[tokio::test]
    async fn test_assemble_is_idempotent_apart_from_loc() {
        let api = populated();
        let first = assemble(&api, "octo", now(), options()).await.unwrap();
        let second = assemble(&api, "octo", now(), options()).await.unwrap();

        let second = ProfileStats {
            lines_of_code: first.lines_of_code,
            ..second
        };
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failing_pull_request_search_is_isolated() {
        let mut api = populated();
        api.searches.remove("author:octo type:pr");

        let stats = assemble(&api, "octo", now(), options()).await.unwrap();
        assert_eq!(stats.pull_requests, PULL_REQUEST_FALLBACK);
        assert_eq!(stats.issues, 8);
        assert_eq!(stats.stars, 10);
        assert_eq!(stats.commits, 420);
        assert_eq!(stats.streak, 2);
    }

    #[tokio::test]
    async fn test_missing_profile_fails() {
        let api = FakeApi::new().with_repos(vec![repo("a", 1)]);
        assert!(assemble(&api, "octo", now(), options()).await.is_err());
    }

    #[tokio::test]
    async fn test_name_falls_back_to_login() {
        let mut user = profile("octo");
        user.name = None;
        let api = FakeApi::new().with_profile(user);

        let stats = assemble(&api, "octo", now(), options()).await.unwrap();
        assert_eq!(stats.name, "octo");
        assert_eq!(stats.repositories, 0);
    }
}
