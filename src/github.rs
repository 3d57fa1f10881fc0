use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{LINK, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Page size used for every paginated REST listing.
pub const PAGE_SIZE: usize = 100;

const USER_AGENT: &str = "profile-badge/0.1.0";
const MAX_RETRIES: usize = 4;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("conflict (empty repository?): {0}")]
    Conflict(String),

    #[error("rate limited and retries exhausted")]
    RateLimited,

    #[error("GitHub API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL reported errors: {0}")]
    GraphQl(String),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    pub created_at: Option<DateTime<Utc>>,
}

/// One repository owned by the subject user. Identity is `name` within the
/// user's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub stargazers_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicEvent {
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContributionTotals {
    pub commits: u64,
    /// Private contributions, only visible when the token allows it.
    pub restricted: u64,
}

/// Read-only view of the hosting platform. Every operation takes the client
/// explicitly so tests can substitute an in-memory source.
#[async_trait]
pub trait GithubApi: Send + Sync {
    async fn user_profile(&self, username: &str) -> Result<UserProfile, ApiError>;

    /// One page (1-based) of repositories owned by `username`, most recently
    /// updated first.
    async fn repositories_page(
        &self,
        username: &str,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<Repository>, ApiError>;

    /// `total_count` reported by the issue search for `query`.
    async fn search_total(&self, query: &str) -> Result<u64, ApiError>;

    /// Number of the last page of a one-per-page commit listing filtered by
    /// author. Used as a proxy for the author's commit count in `repo`.
    async fn commit_page_count(
        &self,
        owner: &str,
        repo: &str,
        author: &str,
    ) -> Result<u64, ApiError>;

    async fn public_events_page(
        &self,
        username: &str,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<PublicEvent>, ApiError>;

    async fn contribution_calendar(
        &self,
        username: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ContributionDay>, ApiError>;

    async fn contribution_totals(
        &self,
        username: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ContributionTotals, ApiError>;
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    base_url: Arc<String>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Create a client for the REST and GraphQL APIs rooted at `base_url`.
    pub fn new(token: &str, base_url: &str) -> anyhow::Result<Self> {
        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            token: Arc::new(token.to_string()),
            base_url: Arc::new(base_url.trim_end_matches('/').to_string()),
            http: Arc::new(http),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request with basic retry/backoff. 404 and 409 are classified so
    /// callers can skip individual resources.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, ApiError> {
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let resp = build()
                .bearer_auth(&*self.token)
                .header("Accept", "application/vnd.github+json")
                .send()
                .await?;

            let status = resp.status();
            if status.is_success() {
                return Ok(resp);
            }

            // If rate limited, honor Retry-After header when present
            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= MAX_RETRIES {
                    return Err(ApiError::RateLimited);
                }
                let wait_secs = resp
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                log::debug!("rate limited, waiting {wait_secs}s before retry {attempt}");
                sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1)));
                log::debug!("HTTP {status}, backing off {backoff:?}");
                sleep(backoff).await;
                continue;
            }

            let url = resp.url().to_string();
            return Err(match status {
                StatusCode::NOT_FOUND => ApiError::NotFound(url),
                StatusCode::CONFLICT => ApiError::Conflict(url),
                _ => ApiError::Status {
                    status: status.as_u16(),
                    body: resp.text().await.unwrap_or_default(),
                },
            });
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let resp = self.send(|| self.http.get(&url).query(query)).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GraphQL request; an `errors` field in the payload is a failure.
    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, ApiError> {
        let url = self.url("/graphql");
        let body = json!({ "query": query, "variables": variables });
        let resp = self.send(|| self.http.post(&url).json(&body)).await?;
        let json: Value = resp.json().await?;

        if let Some(errors) = json.get("errors") {
            return Err(ApiError::GraphQl(format!("{errors:#}")));
        }

        let data = json
            .get("data")
            .cloned()
            .ok_or_else(|| ApiError::GraphQl("response has no data".to_string()))?;
        Ok(serde_json::from_value(data)?)
    }

    async fn contributions_collection(
        &self,
        username: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ContributionsCollection, ApiError> {
        const QUERY: &str = r#"
            query($login: String!, $from: DateTime!, $to: DateTime!) {
                user(login: $login) {
                    contributionsCollection(from: $from, to: $to) {
                        totalCommitContributions
                        restrictedContributionsCount
                        contributionCalendar {
                            weeks {
                                contributionDays {
                                    date
                                    contributionCount
                                }
                            }
                        }
                    }
                }
            }
        "#;

        #[derive(Deserialize)]
        struct UserData {
            user: Option<UserNode>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct UserNode {
            contributions_collection: ContributionsCollection,
        }

        let variables = json!({
            "login": username,
            "from": from.to_rfc3339(),
            "to": to.to_rfc3339(),
        });

        let data: UserData = self.graphql(QUERY, variables).await?;
        data.user
            .map(|u| u.contributions_collection)
            .ok_or_else(|| ApiError::NotFound(format!("user {username}")))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    total_commit_contributions: u64,
    restricted_contributions_count: u64,
    contribution_calendar: ContributionCalendar,
}

#[derive(Deserialize)]
struct ContributionCalendar {
    weeks: Vec<CalendarWeek>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    contribution_days: Vec<CalendarDay>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    date: NaiveDate,
    contribution_count: u32,
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn user_profile(&self, username: &str) -> Result<UserProfile, ApiError> {
        self.get_json(&format!("/users/{username}"), &[]).await
    }

    async fn repositories_page(
        &self,
        username: &str,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<Repository>, ApiError> {
        self.get_json(
            &format!("/users/{username}/repos"),
            &[
                ("type", "owner".to_string()),
                ("sort", "updated".to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    async fn search_total(&self, query: &str) -> Result<u64, ApiError> {
        #[derive(Deserialize)]
        struct SearchResponse {
            total_count: u64,
        }

        let resp: SearchResponse = self
            .get_json(
                "/search/issues",
                &[("q", query.to_string()), ("per_page", "1".to_string())],
            )
            .await?;
        Ok(resp.total_count)
    }

    async fn commit_page_count(
        &self,
        owner: &str,
        repo: &str,
        author: &str,
    ) -> Result<u64, ApiError> {
        let url = self.url(&format!("/repos/{owner}/{repo}/commits"));
        let query = [("author", author.to_string()), ("per_page", "1".to_string())];
        let resp = self.send(|| self.http.get(&url).query(&query)).await?;

        let last = resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(last_page);
        if let Some(last) = last {
            return Ok(last);
        }

        // Without a Link header everything fits on this single page.
        let bytes = resp.bytes().await?;
        let items: Vec<Value> = serde_json::from_slice(&bytes)?;
        Ok(items.len() as u64)
    }

    async fn public_events_page(
        &self,
        username: &str,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<PublicEvent>, ApiError> {
        self.get_json(
            &format!("/users/{username}/events/public"),
            &[
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    async fn contribution_calendar(
        &self,
        username: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ContributionDay>, ApiError> {
        let collection = self.contributions_collection(username, from, to).await?;

        Ok(collection
            .contribution_calendar
            .weeks
            .into_iter()
            .flat_map(|w| w.contribution_days)
            .map(|d| ContributionDay {
                date: d.date,
                count: d.contribution_count,
            })
            .collect())
    }

    async fn contribution_totals(
        &self,
        username: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ContributionTotals, ApiError> {
        let collection = self.contributions_collection(username, from, to).await?;

        Ok(ContributionTotals {
            commits: collection.total_commit_contributions,
            restricted: collection.restricted_contributions_count,
        })
    }
}

/// Extract the `page` parameter of the `rel="last"` entry of a `Link` header.
fn last_page(link: &str) -> Option<u64> {
    link.split(',')
        .find(|part| part.contains(r#"rel="last""#))
        .and_then(|part| {
            let start = part.find('<')?;
            let end = part.find('>')?;
            Url::parse(part.get(start + 1..end)?).ok()
        })
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "page")
                .and_then(|(_, v)| v.parse().ok())
        })
}
