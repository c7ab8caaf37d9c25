//! Partial ISO-8601 date literals (`1990`, `1990-05`, `1990-05-17`,
//! `1990-05-17T08:30[:15]`) and the half-open interval each one covers.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use winnow::combinator::{opt, preceded};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::take_while;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// How much of a date literal was written, which decides the width of the
/// interval it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Year,
    Month,
    Day,
    Minute,
    Second,
}

/// A validated calendar date, possibly partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLiteral {
    start: NaiveDateTime,
    precision: Precision,
}

struct Parts {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
    time: Option<(u32, u32, Option<u32>)>,
}

fn year(input: &mut &str) -> ModalResult<i32> {
    take_while(4, |c: char| c.is_ascii_digit())
        .try_map(|s: &str| s.parse::<i32>())
        .parse_next(input)
}

fn two_digits(input: &mut &str) -> ModalResult<u32> {
    take_while(2, |c: char| c.is_ascii_digit())
        .try_map(|s: &str| s.parse::<u32>())
        .parse_next(input)
}

fn time_of_day(input: &mut &str) -> ModalResult<(u32, u32, Option<u32>)> {
    let (hour, minute, second) = preceded(
        'T',
        (
            two_digits,
            preceded(':', two_digits),
            opt(preceded(':', two_digits)),
        ),
    )
    .parse_next(input)?;
    let _ = opt('Z').parse_next(input)?;
    Ok((hour, minute, second))
}

fn parts(input: &mut &str) -> ModalResult<Parts> {
    let year = year.parse_next(input)?;
    let month = opt(preceded('-', two_digits)).parse_next(input)?;
    let day = match month {
        Some(_) => opt(preceded('-', two_digits)).parse_next(input)?,
        None => None,
    };
    let time = match day {
        Some(_) => opt(time_of_day).parse_next(input)?,
        None => None,
    };
    Ok(Parts {
        year,
        month,
        day,
        time,
    })
}

impl DateLiteral {
    /// Parse and validate a literal. Returns `None` for anything that is not a
    /// real calendar date in one of the accepted shapes.
    #[must_use]
    pub fn parse(text: &str) -> Option<DateLiteral> {
        let parts = parts.parse(text).ok()?;
        let date = NaiveDate::from_ymd_opt(
            parts.year,
            parts.month.unwrap_or(1),
            parts.day.unwrap_or(1),
        )?;
        let (time, precision) = match (parts.month, parts.day, parts.time) {
            (None, _, _) => (NaiveTime::MIN, Precision::Year),
            (Some(_), None, _) => (NaiveTime::MIN, Precision::Month),
            (Some(_), Some(_), None) => (NaiveTime::MIN, Precision::Day),
            (Some(_), Some(_), Some((h, m, None))) => {
                (NaiveTime::from_hms_opt(h, m, 0)?, Precision::Minute)
            }
            (Some(_), Some(_), Some((h, m, Some(s)))) => {
                (NaiveTime::from_hms_opt(h, m, s)?, Precision::Second)
            }
        };
        Some(DateLiteral {
            start: date.and_time(time),
            precision,
        })
    }

    #[must_use]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// First instant covered by the literal.
    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// First instant after the literal's period. `None` only at the end of
    /// chrono's representable range.
    #[must_use]
    pub fn end(&self) -> Option<NaiveDateTime> {
        let date = self.start.date();
        let first_of = |year: i32, month: u32| {
            NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.and_time(NaiveTime::MIN))
        };
        match self.precision {
            Precision::Year => first_of(date.year() + 1, 1),
            Precision::Month if date.month() == 12 => first_of(date.year() + 1, 1),
            Precision::Month => first_of(date.year(), date.month() + 1),
            Precision::Day => date.succ_opt().map(|d| d.and_time(NaiveTime::MIN)),
            Precision::Minute => self.start.checked_add_signed(TimeDelta::minutes(1)),
            Precision::Second => self.start.checked_add_signed(TimeDelta::seconds(1)),
        }
    }
}

/// Render a timestamp the way range bounds are written in compiled queries.
#[must_use]
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
