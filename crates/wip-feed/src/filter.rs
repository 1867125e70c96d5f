//! Date filter controller.
//!
//! Turns calendar selections into the inclusive `[start, end]` bound the
//! engine sends to the store. Day boundaries follow the local calendar of the
//! controller's time zone: a day starts at local midnight and ends one
//! millisecond before the next local midnight. Weeks start on Sunday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use wip_core::DateRange;

/// One-click selections offered next to the calendar picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuickFilter {
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
    ThisYear,
    All,
}

impl QuickFilter {
    /// Menu order.
    pub const ALL: [QuickFilter; 6] = [
        QuickFilter::Today,
        QuickFilter::Yesterday,
        QuickFilter::ThisWeek,
        QuickFilter::ThisMonth,
        QuickFilter::ThisYear,
        QuickFilter::All,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QuickFilter::Today => "Today",
            QuickFilter::Yesterday => "Yesterday",
            QuickFilter::ThisWeek => "This Week",
            QuickFilter::ThisMonth => "This Month",
            QuickFilter::ThisYear => "This Year",
            QuickFilter::All => "All Time",
        }
    }

    /// Calendar days covered relative to `today`; `None` for [`QuickFilter::All`].
    pub fn span(&self, today: NaiveDate) -> Option<DaySpan> {
        let span = match self {
            QuickFilter::Today => DaySpan::single(today),
            QuickFilter::Yesterday => DaySpan::single(today - Duration::days(1)),
            QuickFilter::ThisWeek => {
                let start =
                    today - Duration::days(today.weekday().num_days_from_sunday() as i64);
                DaySpan::new(start, start + Duration::days(6))
            }
            QuickFilter::ThisMonth => {
                let start = today.with_day(1)?;
                DaySpan::new(start, last_day_of_month(start)?)
            }
            QuickFilter::ThisYear => DaySpan::new(
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year(), 12, 31)?,
            ),
            QuickFilter::All => return None,
        };
        Some(span)
    }
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
    };
    next.pred_opt()
}

/// Inclusive span of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DaySpan {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DaySpan {
    /// Create a span; days given backwards are swapped.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    pub fn is_single_day(&self) -> bool {
        self.from == self.to
    }

    /// Resolve to absolute timestamps in `tz`.
    pub fn to_range<Tz: TimeZone>(&self, tz: &Tz) -> DateRange {
        DateRange::new(start_of_day(tz, self.from), end_of_day(tz, self.to))
    }

    /// `"Oct 1 - Oct 7, 2026"`, or `"Oct 7, 2026"` for a single day.
    pub fn label(&self) -> String {
        if self.is_single_day() {
            self.from.format("%b %-d, %Y").to_string()
        } else {
            format!(
                "{} - {}",
                self.from.format("%b %-d"),
                self.to.format("%b %-d, %Y")
            )
        }
    }
}

/// First instant of `day` in `tz`.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    // A DST jump can skip local midnight; the day then starts at the first
    // valid local time after it.
    (0..=2)
        .find_map(|hours| {
            tz.from_local_datetime(&(midnight + Duration::hours(hours)))
                .earliest()
        })
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Last millisecond of `day` in `tz`.
pub fn end_of_day<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let next = day.succ_opt().unwrap_or(day);
    start_of_day(tz, next) - Duration::milliseconds(1)
}

/// What the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FilterSelection {
    Quick { filter: QuickFilter },
    Custom { span: DaySpan },
}

/// Holds the active selection and resolves it against the local calendar.
///
/// Quick filters are resolved when picked: "This Week" chosen on Saturday
/// keeps meaning that week after midnight.
#[derive(Debug, Clone)]
pub struct DateFilterController<Tz: TimeZone> {
    tz: Tz,
    selection: FilterSelection,
    span: Option<DaySpan>,
}

impl<Tz: TimeZone> DateFilterController<Tz> {
    /// Start unfiltered.
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            selection: FilterSelection::Quick {
                filter: QuickFilter::All,
            },
            span: None,
        }
    }

    pub fn selection(&self) -> FilterSelection {
        self.selection
    }

    /// Calendar days of the active selection.
    pub fn span(&self) -> Option<DaySpan> {
        self.span
    }

    /// The bound to hand to the engine.
    pub fn range(&self) -> Option<DateRange> {
        self.span.map(|span| span.to_range(&self.tz))
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// Apply a quick filter relative to `now`.
    pub fn select_quick(&mut self, filter: QuickFilter, now: DateTime<Utc>) -> Option<DateRange> {
        self.selection = FilterSelection::Quick { filter };
        self.span = filter.span(self.today(now));
        self.range()
    }

    /// Apply a calendar pick. A missing start clears the filter; a missing
    /// end makes it a single day.
    pub fn select_custom(
        &mut self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Option<DateRange> {
        let Some(from) = from else {
            return self.clear();
        };
        let span = DaySpan::new(from, to.unwrap_or(from));
        self.selection = FilterSelection::Custom { span };
        self.span = Some(span);
        self.range()
    }

    pub fn clear(&mut self) -> Option<DateRange> {
        self.selection = FilterSelection::Quick {
            filter: QuickFilter::All,
        };
        self.span = None;
        None
    }

    pub fn is_active(&self) -> bool {
        self.span.is_some()
    }

    /// Caption of the quick-filter button.
    pub fn filter_label(&self) -> &'static str {
        match self.selection {
            FilterSelection::Quick {
                filter: QuickFilter::All,
            }
            | FilterSelection::Custom { .. } => "Filter",
            FilterSelection::Quick { filter } => filter.label(),
        }
    }

    /// Caption of the calendar button.
    pub fn range_label(&self) -> String {
        format_day_span(self.span)
    }
}

/// Human-readable span, `"Pick a date"` when there is none.
pub fn format_day_span(span: Option<DaySpan>) -> String {
    match span {
        Some(span) => span.label(),
        None => "Pick a date".to_string(),
    }
}
