//! Day grouping for display.
//!
//! Groups are keyed by the local calendar day of `created_at` and ordered by
//! that date, never by their label text.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use wip_core::Item;

use crate::entry::FeedItem;

/// Anything carrying a creation timestamp.
pub trait Dated {
    fn created_at(&self) -> DateTime<Utc>;
}

impl Dated for FeedItem {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Dated for Item {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Which list is being grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupView {
    /// Live feed: oldest day first, `"Oct 17, 2026"`.
    Feed,
    /// Timeline: newest day first, `"October 17, 2026"`.
    Timeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum DayLabel {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl DayLabel {
    pub fn for_day(day: NaiveDate, today: NaiveDate) -> Self {
        if day == today {
            DayLabel::Today
        } else if Some(day) == today.pred_opt() {
            DayLabel::Yesterday
        } else {
            DayLabel::Date(day)
        }
    }

    pub fn render(&self, view: GroupView) -> String {
        match (self, view) {
            (DayLabel::Today, _) => "Today".to_string(),
            (DayLabel::Yesterday, _) => "Yesterday".to_string(),
            (DayLabel::Date(day), GroupView::Feed) => day.format("%b %-d, %Y").to_string(),
            (DayLabel::Date(day), GroupView::Timeline) => day.format("%B %-d, %Y").to_string(),
        }
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(GroupView::Feed))
    }
}

/// Entries sharing one local calendar day, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<'a, T> {
    pub date: NaiveDate,
    pub label: DayLabel,
    pub items: Vec<&'a T>,
}

/// Group `items` by local day in `now`'s time zone.
pub fn group_by_day<'a, T, Tz>(items: &'a [T], view: GroupView, now: &DateTime<Tz>) -> Vec<DayGroup<'a, T>>
where
    T: Dated,
    Tz: TimeZone,
{
    let tz = now.timezone();
    let today = now.date_naive();

    let mut days: BTreeMap<NaiveDate, Vec<&'a T>> = BTreeMap::new();
    for item in items {
        let day = item.created_at().with_timezone(&tz).date_naive();
        days.entry(day).or_default().push(item);
    }

    let groups = days.into_iter().map(|(date, items)| DayGroup {
        date,
        label: DayLabel::for_day(date, today),
        items,
    });
    match view {
        GroupView::Feed => groups.collect(),
        GroupView::Timeline => groups.rev().collect(),
    }
}

/// Local calendar day `days_ago` days before `now`.
pub fn days_before<Tz: TimeZone>(now: &DateTime<Tz>, days_ago: i64) -> NaiveDate {
    now.date_naive() - Duration::days(days_ago)
}
