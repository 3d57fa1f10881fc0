//! age.rs
//!
//! Account age in the form "X years, Y months, Z days".
//!
//! Whole months are counted from the join date using chrono's month
//! arithmetic (which clamps to the end of shorter months), and the remaining
//! days are what is left until today.

use chrono::{Datelike, Months, NaiveDate};

/// Returns how long ago `joined` was, relative to `today`.
pub fn membership_duration(joined: NaiveDate, today: NaiveDate) -> String {
    if today <= joined {
        return describe(0, 0, 0);
    }

    let mut months = (today.year() - joined.year()) * 12 + today.month() as i32
        - joined.month() as i32;
    let mut anchor = add_months(joined, months);

    // Day of month not reached yet
    if anchor > today {
        months -= 1;
        anchor = add_months(joined, months);
    }

    let days = (today - anchor).num_days();
    describe(i64::from(months / 12), i64::from(months % 12), days)
}

fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    date.checked_add_months(Months::new(months.max(0) as u32))
        .unwrap_or(date)
}

fn describe(years: i64, months: i64, days: i64) -> String {
    format!(
        "{years} year{}, {months} month{}, {days} day{}",
        plural(years),
        plural(months),
        plural(days)
    )
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
