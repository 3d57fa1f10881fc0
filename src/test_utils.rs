//! In-memory `GithubApi` for pipeline tests.
//!
//! Each endpoint can be configured with data or forced to fail; requests are
//! recorded so tests can assert on what the pipeline asked for.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::github::{
    ApiError, ContributionDay, ContributionTotals, GithubApi, PublicEvent, Repository, UserProfile,
};

pub fn repo(name: &str, stars: u32) -> Repository {
    Repository {
        name: name.to_string(),
        fork: false,
        stargazers_count: stars,
    }
}

pub fn fork(name: &str, stars: u32) -> Repository {
    Repository {
        fork: true,
        ..repo(name, stars)
    }
}

pub fn profile(login: &str) -> UserProfile {
    UserProfile {
        login: login.to_string(),
        name: Some("Octo Cat".to_string()),
        location: Some("Lisbon".to_string()),
        bio: None,
        company: None,
        blog: Some(String::new()),
        followers: 12,
        following: 3,
        created_at: "2015-03-01T10:00:00Z".parse().ok(),
    }
}

fn failure(what: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        body: format!("{what} unavailable"),
    }
}

#[derive(Default)]
pub struct FakeApi {
    pub profile: Option<UserProfile>,
    pub repos: Vec<Repository>,
    pub searches: HashMap<String, u64>,
    pub commit_pages: HashMap<String, Result<u64, u16>>,
    pub calendar: Option<Vec<ContributionDay>>,
    pub totals: Option<ContributionTotals>,
    pub events: Option<Vec<PublicEvent>>,
    pub requested_pages: Mutex<Vec<u32>>,
    pub requested_event_pages: Mutex<Vec<u32>>,
    pub commit_requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_repos(mut self, repos: Vec<Repository>) -> Self {
        self.repos = repos;
        self
    }

    /// `count` numbered repositories, each with one star.
    pub fn with_repo_count(self, count: usize) -> Self {
        let repos = (0..count).map(|i| repo(&format!("repo-{i}"), 1)).collect();
        self.with_repos(repos)
    }

    pub fn with_search(mut self, query: &str, total: u64) -> Self {
        self.searches.insert(query.to_string(), total);
        self
    }

    pub fn with_commit_pages(mut self, repo: &str, pages: u64) -> Self {
        self.commit_pages.insert(repo.to_string(), Ok(pages));
        self
    }

    /// Make the commit listing of `repo` answer with an HTTP status error.
    pub fn with_commit_status(mut self, repo: &str, status: u16) -> Self {
        self.commit_pages.insert(repo.to_string(), Err(status));
        self
    }

    pub fn with_calendar(mut self, days: &[(NaiveDate, u32)]) -> Self {
        self.calendar = Some(
            days.iter()
                .map(|&(date, count)| ContributionDay { date, count })
                .collect(),
        );
        self
    }

    pub fn with_totals(mut self, commits: u64, restricted: u64) -> Self {
        self.totals = Some(ContributionTotals {
            commits,
            restricted,
        });
        self
    }

    pub fn with_events(mut self, times: &[DateTime<Utc>]) -> Self {
        self.events = Some(
            times
                .iter()
                .map(|&created_at| PublicEvent { created_at })
                .collect(),
        );
        self
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested_pages.lock().unwrap().clone()
    }

    pub fn requested_event_pages(&self) -> Vec<u32> {
        self.requested_event_pages.lock().unwrap().clone()
    }

    pub fn commit_requests(&self) -> Vec<String> {
        self.commit_requests.lock().unwrap().clone()
    }
}

fn page_of<T: Clone>(items: &[T], page: u32, per_page: usize) -> Vec<T> {
    let start = (page.saturating_sub(1) as usize) * per_page;
    items.iter().skip(start).take(per_page).cloned().collect()
}

#[async_trait]
impl GithubApi for FakeApi {
    async fn user_profile(&self, username: &str) -> Result<UserProfile, ApiError> {
        self.profile
            .clone()
            .ok_or_else(|| ApiError::NotFound(format!("user {username}")))
    }

    async fn repositories_page(
        &self,
        _username: &str,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<Repository>, ApiError> {
        self.requested_pages.lock().unwrap().push(page);
        Ok(page_of(&self.repos, page, per_page))
    }

    async fn search_total(&self, query: &str) -> Result<u64, ApiError> {
        self.searches
            .get(query)
            .copied()
            .ok_or_else(|| failure("search"))
    }

    async fn commit_page_count(
        &self,
        _owner: &str,
        repo: &str,
        _author: &str,
    ) -> Result<u64, ApiError> {
        self.commit_requests.lock().unwrap().push(repo.to_string());
        match self.commit_pages.get(repo) {
            Some(Ok(pages)) => Ok(*pages),
            Some(Err(404)) => Err(ApiError::NotFound(repo.to_string())),
            Some(Err(409)) => Err(ApiError::Conflict(repo.to_string())),
            Some(Err(status)) => Err(ApiError::Status {
                status: *status,
                body: String::new(),
            }),
            None => Ok(0),
        }
    }

    async fn public_events_page(
        &self,
        _username: &str,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<PublicEvent>, ApiError> {
        self.requested_event_pages.lock().unwrap().push(page);
        let events = self.events.as_ref().ok_or_else(|| failure("events"))?;
        Ok(page_of(events, page, per_page))
    }

    async fn contribution_calendar(
        &self,
        _username: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<ContributionDay>, ApiError> {
        self.calendar.clone().ok_or_else(|| failure("calendar"))
    }

    async fn contribution_totals(
        &self,
        _username: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<ContributionTotals, ApiError> {
        self.totals.ok_or_else(|| failure("totals"))
    }
}
