//! U.S. equity market calendar.
//!
//! Knows weekends and the NYSE holiday set, and resolves the last trading day
//! on or before a date. Used by the price service to decide whether a cached
//! historical series still covers a requested window.
//!
//! # Conventions
//!
//! - A fixed-date holiday falling on Saturday is observed the Friday before,
//!   one falling on Sunday the Monday after (when
//!   [`HolidayRules::observe_weekend_holidays`] is set). New Year's Day on a
//!   Saturday is not observed, matching exchange practice of not closing on
//!   the last trading day of the year.
//! - Good Friday is computed from the Gregorian Easter date and can be
//!   excluded through [`HolidayRules::good_friday`].
//! - Juneteenth counts from 2022, its first year as an exchange holiday.

mod coverage;

pub use coverage::{classify_coverage, CacheCoverage};

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// First year Juneteenth closed the exchanges.
const JUNETEENTH_FIRST_YEAR: i32 = 2022;

/// Exchange holidays recognized by the calendar.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Holiday {
    NewYearsDay,
    MartinLutherKingDay,
    PresidentsDay,
    GoodFriday,
    MemorialDay,
    Juneteenth,
    IndependenceDay,
    LaborDay,
    Thanksgiving,
    Christmas,
}

impl Holiday {
    pub const ALL: [Holiday; 10] = [
        Holiday::NewYearsDay,
        Holiday::MartinLutherKingDay,
        Holiday::PresidentsDay,
        Holiday::GoodFriday,
        Holiday::MemorialDay,
        Holiday::Juneteenth,
        Holiday::IndependenceDay,
        Holiday::LaborDay,
        Holiday::Thanksgiving,
        Holiday::Christmas,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NewYearsDay => "New Year's Day",
            Self::MartinLutherKingDay => "Martin Luther King Jr. Day",
            Self::PresidentsDay => "Presidents' Day",
            Self::GoodFriday => "Good Friday",
            Self::MemorialDay => "Memorial Day",
            Self::Juneteenth => "Juneteenth",
            Self::IndependenceDay => "Independence Day",
            Self::LaborDay => "Labor Day",
            Self::Thanksgiving => "Thanksgiving Day",
            Self::Christmas => "Christmas Day",
        }
    }

    fn is_fixed_date(&self) -> bool {
        matches!(
            self,
            Self::NewYearsDay | Self::Juneteenth | Self::IndependenceDay | Self::Christmas
        )
    }

    /// The calendar date of the holiday before any weekend observance.
    fn nominal_date(&self, year: i32) -> Option<NaiveDate> {
        match self {
            Self::NewYearsDay => NaiveDate::from_ymd_opt(year, 1, 1),
            Self::MartinLutherKingDay => nth_weekday(year, 1, Weekday::Mon, 3),
            Self::PresidentsDay => nth_weekday(year, 2, Weekday::Mon, 3),
            Self::GoodFriday => easter_sunday(year).map(|easter| easter - Duration::days(2)),
            Self::MemorialDay => last_weekday(year, 5, Weekday::Mon),
            Self::Juneteenth if year >= JUNETEENTH_FIRST_YEAR => NaiveDate::from_ymd_opt(year, 6, 19),
            Self::Juneteenth => None,
            Self::IndependenceDay => NaiveDate::from_ymd_opt(year, 7, 4),
            Self::LaborDay => nth_weekday(year, 9, Weekday::Mon, 1),
            Self::Thanksgiving => nth_weekday(year, 11, Weekday::Thu, 4),
            Self::Christmas => NaiveDate::from_ymd_opt(year, 12, 25),
        }
    }
}

/// Tunable parts of the holiday set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HolidayRules {
    /// Treat Good Friday as a market holiday.
    pub good_friday: bool,
    /// Move fixed-date holidays off weekends (Sat -> Fri, Sun -> Mon).
    pub observe_weekend_holidays: bool,
}

impl Default for HolidayRules {
    fn default() -> Self {
        Self {
            good_friday: true,
            observe_weekend_holidays: true,
        }
    }
}

/// Trading-day arithmetic for U.S. equity markets.
#[derive(Clone, Debug, Default)]
pub struct MarketCalendar {
    rules: HolidayRules,
}

impl MarketCalendar {
    pub fn new(rules: HolidayRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> HolidayRules {
        self.rules
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Observed holiday dates for `year`, in calendar order.
    pub fn holidays(&self, year: i32) -> Vec<(NaiveDate, Holiday)> {
        let mut days: Vec<(NaiveDate, Holiday)> = Holiday::ALL
            .iter()
            .filter(|h| self.rules.good_friday || **h != Holiday::GoodFriday)
            .filter_map(|h| self.observed_date(*h, year).map(|d| (d, *h)))
            .collect();
        days.sort_by_key(|(date, _)| *date);
        days
    }

    fn observed_date(&self, holiday: Holiday, year: i32) -> Option<NaiveDate> {
        let date = holiday.nominal_date(year)?;
        if !self.rules.observe_weekend_holidays || !holiday.is_fixed_date() {
            return Some(date);
        }
        match date.weekday() {
            Weekday::Sat if holiday == Holiday::NewYearsDay => None,
            Weekday::Sat => date.pred_opt(),
            Weekday::Sun => date.succ_opt(),
            _ => Some(date),
        }
    }

    /// The holiday observed on `date`, if any.
    pub fn holiday_on(&self, date: NaiveDate) -> Option<Holiday> {
        self.holidays(date.year())
            .into_iter()
            .find(|(day, _)| *day == date)
            .map(|(_, holiday)| holiday)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holiday_on(date).is_some()
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !Self::is_weekend(date) && !self.is_holiday(date)
    }

    /// Most recent trading day on or before `date`.
    pub fn last_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut day = date;
        while !self.is_trading_day(day) {
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        day
    }
}

/// `n`-th (1-based) `weekday` of a month.
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

/// Last `weekday` of a month.
fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut day = first_of_next.pred_opt()?;
    while day.weekday() != weekday {
        day = day.pred_opt()?;
    }
    Some(day)
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
