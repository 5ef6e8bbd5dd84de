use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use super::services::BillError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Month,
    Year,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub period: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

/// Calendar window a statistics request covers: `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub period: Period,
    pub year: i32,
    pub month: u8,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn out_of_range() -> BillError {
    BillError::Invalid("year is out of range".into())
}

fn first_of(year: i32, month: Month) -> Result<Date, BillError> {
    Date::from_calendar_date(year, month, 1).map_err(|_| out_of_range())
}

impl StatsWindow {
    /// Resolve the window, taking missing year/month from `today`.
    pub fn resolve(params: &StatsParams, today: Date) -> Result<Self, BillError> {
        let period = match present(&params.period) {
            None | Some("month") => Period::Month,
            Some("year") => Period::Year,
            Some(_) => return Err(BillError::Invalid("period must be month or year".into())),
        };
        let year: i32 = match present(&params.year) {
            Some(y) => y.parse().map_err(|_| BillError::Invalid("year must be an integer".into()))?,
            None => today.year(),
        };
        let month_no: u8 = match present(&params.month) {
            Some(m) => m
                .parse()
                .map_err(|_| BillError::Invalid("month must be between 1 and 12".into()))?,
            None => u8::from(today.month()),
        };
        let month = Month::try_from(month_no)
            .map_err(|_| BillError::Invalid("month must be between 1 and 12".into()))?;

        let (start, end) = match period {
            Period::Year => (
                first_of(year, Month::January)?,
                first_of(year.checked_add(1).ok_or_else(out_of_range)?, Month::January)?,
            ),
            Period::Month => {
                let next_year = if month == Month::December {
                    year.checked_add(1).ok_or_else(out_of_range)?
                } else {
                    year
                };
                (first_of(year, month)?, first_of(next_year, month.next())?)
            }
        };

        Ok(Self {
            period,
            year,
            month: month_no,
            start: start.midnight().assume_utc(),
            end: end.midnight().assume_utc(),
        })
    }

    pub fn first_day(&self) -> Date {
        self.start.date()
    }

    pub fn last_day(&self) -> Date {
        self.end.date().previous_day().unwrap_or(self.end.date())
    }
}
