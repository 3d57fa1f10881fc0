//! Current contribution streak.
//!
//! A streak is the run of consecutive UTC days with at least one contribution
//! ending today or yesterday. Today's activity may not be recorded yet, so a
//! streak whose latest day is yesterday is still active; a two-day gap ends it.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;

use crate::github::{ContributionDay, GithubApi, PAGE_SIZE};

/// Days of calendar history requested. Also the upper bound of a streak.
pub const CALENDAR_SPAN_DAYS: i64 = 365;

/// Pages of the public events feed read by the fallback strategy.
const EVENT_PAGE_LIMIT: u32 = 3;

/// Streak from day-level contribution counts. Only days with a count above
/// zero are contribution days.
pub fn streak_from_calendar(days: &[ContributionDay], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = days
        .iter()
        .filter(|d| d.count > 0)
        .map(|d| d.date)
        .collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let Some((&first, rest)) = dates.split_first() else {
        return 0;
    };

    if first != today && Some(first) != today.pred_opt() {
        return 0;
    }

    let mut streak = 1u32;
    let mut expected = first.pred_opt();

    for &date in rest {
        if Some(date) != expected {
            break;
        }
        streak += 1;
        expected = date.pred_opt();
    }

    streak.min(CALENDAR_SPAN_DAYS as u32)
}

/// Streak from the dates on which any public event happened.
///
/// Walks backwards from today, accepting each date that is at most one day
/// before the previous one. Coarser than the calendar (presence of events,
/// not contribution counts) but follows the same continuation rule.
pub fn streak_from_event_dates(
    dates: impl IntoIterator<Item = NaiveDate>,
    today: NaiveDate,
) -> u32 {
    let distinct: BTreeSet<NaiveDate> = dates.into_iter().filter(|d| *d <= today).collect();

    let mut streak = 0u32;
    let mut cursor = today;

    for date in distinct.into_iter().rev() {
        if (cursor - date).num_days() > 1 {
            break;
        }
        streak += 1;
        cursor = date;
    }

    streak
}

/// Current streak for `username`.
///
/// Uses the contribution calendar, then the public events feed, then
/// `fallback` (capped at `CALENDAR_SPAN_DAYS`) when both requests fail.
pub async fn current_streak(
    api: &dyn GithubApi,
    username: &str,
    now: DateTime<Utc>,
    fallback: u32,
) -> u32 {
    let today = now.date_naive();

    match api
        .contribution_calendar(username, now - Duration::days(CALENDAR_SPAN_DAYS), now)
        .await
    {
        Ok(days) => return streak_from_calendar(&days, today),
        Err(e) => log::warn!("Contribution calendar unavailable, using public events: {e}"),
    }

    match public_event_dates(api, username).await {
        Ok(dates) => streak_from_event_dates(dates, today),
        Err(e) => {
            let fallback = fallback.min(CALENDAR_SPAN_DAYS as u32);
            log::warn!("Public events unavailable, using streak fallback {fallback}: {e:#}");
            fallback
        }
    }
}

async fn public_event_dates(api: &dyn GithubApi, username: &str) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::new();

    for page in 1..=EVENT_PAGE_LIMIT {
        let events = api
            .public_events_page(username, page, PAGE_SIZE)
            .await
            .with_context(|| format!("Failed to fetch public events page {page}"))?;

        let full = events.len() == PAGE_SIZE;
        dates.extend(events.iter().map(|e| e.created_at.date_naive()));

        if !full {
            break;
        }
    }

    Ok(dates)
}
