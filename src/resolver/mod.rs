/// Active time-window resolution
use crate::domain::QuickTime;
use crate::errors::{ApiError, ApiResult};
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};
use tracing::{error, warn};

/// At most this many quick times are shown at once
pub const MAX_ACTIVE: usize = 2;

/// Last Sunday of `month` in `year`.
pub fn last_sunday_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let mut day = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    while day.weekday() != Weekday::Sun {
        day = day.pred_opt()?;
    }
    Some(day)
}

/// Whether the UK observes British Summer Time at `now`.
///
/// BST runs from 01:00 GMT on the last Sunday of March up to, but not
/// including, 01:00 GMT on the last Sunday of October.
pub fn is_uk_summer_time(now: DateTime<Utc>) -> bool {
    let year = now.year();
    let boundary = |month| {
        last_sunday_of_month(year, month)
            .and_then(|d| d.and_hms_opt(1, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    };

    match (boundary(3), boundary(10)) {
        (Some(start), Some(end)) => now >= start && now < end,
        _ => false,
    }
}

/// UK wall-clock time for a UTC instant
pub fn uk_local_now(now: DateTime<Utc>) -> NaiveDateTime {
    if is_uk_summer_time(now) {
        (now + Duration::hours(1)).naive_utc()
    } else {
        now.naive_utc()
    }
}

fn parse_clock(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

/// Whether `qt` is active at wall-clock `now`: today is one of its days and
/// `start <= now < end`.
pub fn is_active(qt: &QuickTime, now: NaiveDateTime) -> bool {
    let today = now.weekday().num_days_from_sunday() as u8;
    if !qt.days.contains(&today) {
        return false;
    }

    match (parse_clock(&qt.start), parse_clock(&qt.end)) {
        (Some(start), Some(end)) => {
            let date = now.date();
            date.and_time(start) <= now && now < date.and_time(end)
        }
        _ => {
            warn!(
                "Quick time {} has unreadable window {}-{}, skipping",
                qt.id, qt.start, qt.end
            );
            false
        }
    }
}

/// First active quick times in list order. Scanning stops as soon as
/// `MAX_ACTIVE` have matched.
pub fn select_active<'a, I>(rules: I, now: NaiveDateTime) -> Vec<&'a QuickTime>
where
    I: IntoIterator<Item = &'a QuickTime>,
{
    let mut active = Vec::with_capacity(MAX_ACTIVE);
    for qt in rules {
        if is_active(qt, now) {
            active.push(qt);
            if active.len() == MAX_ACTIVE {
                break;
            }
        }
    }
    active
}

/// Quick times matched for one evaluation instant
#[derive(Debug, Clone)]
pub struct ActiveWindows {
    pub local_time: NaiveDateTime,
    pub rules: Vec<QuickTime>,
}

impl ActiveWindows {
    pub fn count(&self) -> usize {
        self.rules.len()
    }

    /// Rejects a match set larger than the cap. Unreachable through
    /// `select_active`, reported loudly if it ever happens.
    pub fn checked(self) -> ApiResult<Self> {
        if self.count() > MAX_ACTIVE {
            error!(
                "{} quick times active at {}, at most {} expected",
                self.count(),
                self.local_time,
                MAX_ACTIVE
            );
            return Err(ApiError::Invariant(format!(
                "{} quick times active at once",
                self.count()
            )));
        }
        Ok(self)
    }
}

/// Apply the BST correction to `now` and pick the active quick times.
pub fn resolve(rules: &[QuickTime], now: DateTime<Utc>) -> ActiveWindows {
    let local_time = uk_local_now(now);
    let rules = select_active(rules, local_time)
        .into_iter()
        .cloned()
        .collect();
    ActiveWindows { local_time, rules }
}
