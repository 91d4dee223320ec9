//! Opening-hours evaluation
//!
//! Attraction records carry a free-form opening-hours string such as
//! `"04/01-10/31 08:00-18:00;11/01-03/31 08:30-17:00"` or `"全天开放"`.
//! This module parses those strings into an [`OpeningSchedule`] and answers
//! whether an attraction is open on a given date. Anything that cannot be
//! understood is treated as open.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Open every day
pub const ALL_DAY_MARKER: &str = "全天开放";
/// Not open to visitors, apart from explicitly listed dates
pub const CLOSED_MARKER: &str = "不开放";
/// Closed on the explicitly listed dates only
pub const CLOSED_ON_DATES_MARKER: &str = "闭馆";

/// Public holidays that opening-hours rules may refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Holiday {
    NewYear,
    SpringFestival,
    QingMing,
    LabourDay,
    DragonBoat,
    MidAutumn,
    NationalDay,
}

impl Holiday {
    pub const ALL: [Holiday; 7] = [
        Holiday::NewYear,
        Holiday::SpringFestival,
        Holiday::QingMing,
        Holiday::LabourDay,
        Holiday::DragonBoat,
        Holiday::MidAutumn,
        Holiday::NationalDay,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Holiday::NewYear => "元旦节",
            Holiday::SpringFestival => "春节",
            Holiday::QingMing => "清明节",
            Holiday::LabourDay => "劳动节",
            Holiday::DragonBoat => "端午节",
            Holiday::MidAutumn => "中秋节",
            Holiday::NationalDay => "国庆节",
        }
    }

    /// The holiday falling on `date`, if the calendar knows one.
    ///
    /// Only fixed-date holidays are recognized; lunar holidays never match.
    #[must_use]
    pub fn on(date: NaiveDate) -> Option<Holiday> {
        match (date.month(), date.day()) {
            (1, 1) => Some(Holiday::NewYear),
            (5, 1) => Some(Holiday::LabourDay),
            (10, 1) => Some(Holiday::NationalDay),
            _ => None,
        }
    }
}

/// Month and day without a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    fn parse(token: &str) -> Option<Self> {
        let (month, day) = token.trim().split_once('/')?;
        let month: u32 = month.trim().parse().ok()?;
        let day: u32 = day.trim().parse().ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(Self { month, day })
    }

    fn in_year(self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

/// A dated rule: `MM/DD-MM/DD` followed by optional weekday and holiday restrictions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningRule {
    pub start: MonthDay,
    pub end: MonthDay,
    pub weekdays: Vec<Weekday>,
    pub holidays: Vec<Holiday>,
}

impl OpeningRule {
    fn parse(rule: &str) -> Option<Self> {
        let rule = rule.trim();
        let (date_part, rest) = match rule.split_once(char::is_whitespace) {
            Some((date_part, rest)) => (date_part, rest),
            None => (rule, ""),
        };
        let (start, end) = date_part.split_once('-')?;

        Some(Self {
            start: MonthDay::parse(start)?,
            end: MonthDay::parse(end)?,
            weekdays: parse_weekdays(rest),
            holidays: Holiday::ALL
                .into_iter()
                .filter(|holiday| rest.contains(holiday.label()))
                .collect(),
        })
    }

    /// Whether the rule covers `date`, evaluated in the date's own year.
    ///
    /// A range whose start lies after its end wraps over New Year.
    #[must_use]
    pub fn matches(&self, date: NaiveDate) -> bool {
        let (Some(start), Some(end)) = (
            self.start.in_year(date.year()),
            self.end.in_year(date.year()),
        ) else {
            return false;
        };

        let in_range = if start <= end {
            start <= date && date <= end
        } else {
            date >= start || date <= end
        };
        if !in_range {
            return false;
        }

        if !self.weekdays.is_empty() && !self.weekdays.contains(&date.weekday()) {
            return false;
        }

        if !self.holidays.is_empty() {
            match Holiday::on(date) {
                Some(holiday) if self.holidays.contains(&holiday) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Parsed form of an opening-hours string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpeningSchedule {
    /// Empty, `全天开放`, or nothing recognizable
    AlwaysOpen,
    /// `不开放`: closed unless the date is listed literally
    Closed { raw: String },
    /// `闭馆`: open unless the date is listed literally
    ClosedOnDates { raw: String },
    /// At least one dated rule
    Rules { rules: Vec<OpeningRule>, raw: String },
}

impl OpeningSchedule {
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.is_empty() || spec.contains(ALL_DAY_MARKER) {
            return OpeningSchedule::AlwaysOpen;
        }
        if spec.contains(CLOSED_MARKER) {
            return OpeningSchedule::Closed {
                raw: spec.to_string(),
            };
        }
        if spec.contains(CLOSED_ON_DATES_MARKER) {
            return OpeningSchedule::ClosedOnDates {
                raw: spec.to_string(),
            };
        }

        let rules: Vec<OpeningRule> = spec
            .split(';')
            .map(str::trim)
            .filter(|rule| !rule.is_empty())
            .filter_map(OpeningRule::parse)
            .collect();

        if rules.is_empty() {
            OpeningSchedule::AlwaysOpen
        } else {
            OpeningSchedule::Rules {
                rules,
                raw: spec.to_string(),
            }
        }
    }

    /// Whether the schedule is open on `date`. Without a date only a
    /// `不开放` schedule counts as closed.
    #[must_use]
    pub fn is_open_on(&self, date: Option<NaiveDate>) -> bool {
        let token = date.map(|date| date.format("%m/%d").to_string());

        match self {
            OpeningSchedule::AlwaysOpen => true,
            OpeningSchedule::Closed { raw } => token.is_some_and(|token| raw.contains(&token)),
            OpeningSchedule::ClosedOnDates { raw } => token.is_none_or(|token| !raw.contains(&token)),
            OpeningSchedule::Rules { rules, raw } => date.zip(token).is_none_or(|(date, token)| {
                rules.iter().any(|rule| rule.matches(date)) || raw.contains(&token)
            }),
        }
    }
}

/// Evaluate an opening-hours string for a date without caching
#[must_use]
pub fn is_open(hours_spec: &str, date: Option<NaiveDate>) -> bool {
    OpeningSchedule::parse(hours_spec).is_open_on(date)
}

fn weekday_from_char(c: char) -> Option<Weekday> {
    match c {
        '一' => Some(Weekday::Mon),
        '二' => Some(Weekday::Tue),
        '三' => Some(Weekday::Wed),
        '四' => Some(Weekday::Thu),
        '五' => Some(Weekday::Fri),
        '六' => Some(Weekday::Sat),
        '日' | '天' => Some(Weekday::Sun),
        _ => None,
    }
}

/// Weekdays named in `text` as `周X` or `星期X`; `周一至周五` expands to the span
fn parse_weekdays(text: &str) -> Vec<Weekday> {
    let chars: Vec<char> = text.chars().collect();

    // (first char index, one past last char index, weekday)
    let mut found: Vec<(usize, usize, Weekday)> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let prefix_len = if chars[i] == '周' {
            1
        } else if chars[i] == '星' && chars.get(i + 1) == Some(&'期') {
            2
        } else {
            0
        };
        if prefix_len > 0 {
            if let Some(day) = chars.get(i + prefix_len).copied().and_then(weekday_from_char) {
                found.push((i, i + prefix_len + 1, day));
                i += prefix_len + 1;
                continue;
            }
        }
        i += 1;
    }

    fn push(day: Weekday, weekdays: &mut Vec<Weekday>) {
        if !weekdays.contains(&day) {
            weekdays.push(day);
        }
    }

    let mut weekdays = Vec::new();

    let mut k = 0;
    while k < found.len() {
        let (_, end, day) = found[k];
        if let Some(&(next_start, _, last)) = found.get(k + 1) {
            let between: String = chars[end..next_start].iter().collect();
            if matches!(between.trim(), "至" | "到" | "-" | "~") {
                let mut current = day;
                push(current, &mut weekdays);
                while current != last {
                    current = current.succ();
                    push(current, &mut weekdays);
                }
                k += 2;
                continue;
            }
        }
        push(day, &mut weekdays);
        k += 1;
    }

    weekdays
}

/// Memoized opening-hours lookups.
///
/// Verdicts are keyed by the exact spec string and date, and each distinct
/// spec string is parsed only once. Entries are never invalidated since
/// both inputs are immutable for the lifetime of a catalog.
#[derive(Debug, Default)]
pub struct OpeningHoursCache {
    schedules: RwLock<HashMap<String, Arc<OpeningSchedule>>>,
    verdicts: RwLock<HashMap<(String, Option<NaiveDate>), bool>>,
}

impl OpeningHoursCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, hours_spec: &str, date: Option<NaiveDate>) -> bool {
        let key = (hours_spec.to_string(), date);
        if let Some(verdict) = self
            .verdicts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return *verdict;
        }

        let verdict = self.schedule(hours_spec).is_open_on(date);
        trace!(spec = hours_spec, ?date, verdict, "Opening hours evaluated");
        self.verdicts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, verdict);
        verdict
    }

    /// The parsed schedule for a spec string, parsing it on first use
    pub fn schedule(&self, hours_spec: &str) -> Arc<OpeningSchedule> {
        if let Some(schedule) = self
            .schedules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hours_spec)
        {
            return Arc::clone(schedule);
        }

        let schedule = Arc::new(OpeningSchedule::parse(hours_spec));
        self.schedules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(hours_spec.to_string())
            .or_insert(schedule)
            .clone()
    }

    /// Number of memoized (spec, date) verdicts
    pub fn len(&self) -> usize {
        self.verdicts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct spec strings parsed so far
    pub fn parsed_specs(&self) -> usize {
        self.schedules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
