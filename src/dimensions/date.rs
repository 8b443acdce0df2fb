//! Generated calendar date dimension

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use tracing::info;

use super::error::DimensionError;
use crate::models::dimensions::DateDimension;

/// Generates one row per calendar day in a closed date range
pub struct DateDimensionBuilder<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub holidays: &'a [NaiveDate],
}

impl DateDimensionBuilder<'_> {
    pub fn build(&self) -> Result<Vec<DateDimension>, DimensionError> {
        if self.start > self.end {
            return Err(DimensionError::InvalidDateRange(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }

        let holidays: HashSet<NaiveDate> = self.holidays.iter().copied().collect();
        let mut rows = Vec::new();
        let mut date = self.start;
        while date <= self.end {
            let day_of_week = date.weekday().number_from_monday();
            rows.push(DateDimension {
                date_key: DateDimension::key_for(date),
                date,
                year: date.year(),
                quarter: (date.month() - 1) / 3 + 1,
                month: date.month(),
                month_name: date.format("%B").to_string(),
                week: date.iso_week().week(),
                day_of_month: date.day(),
                day_of_week,
                day_name: date.format("%A").to_string(),
                is_weekend: day_of_week >= 6,
                is_holiday: holidays.contains(&date),
            });
            date = date.succ_opt().ok_or_else(|| {
                DimensionError::InvalidDateRange(format!("range extends past {}", date))
            })?;
        }

        info!(
            rows = rows.len(),
            start = %self.start,
            end = %self.end,
            "Date dimension generated"
        );
        Ok(rows)
    }
}
