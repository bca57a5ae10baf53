//! Bikram Sambat <-> Gregorian conversion.
//!
//! Table driven: one row of month lengths per BS year, anchored at the AD
//! date of 1 Baisakh of the first year in the table. Anything outside the
//! table is a [`ConversionError`], never a guess.

use std::ops::RangeInclusive;

use chrono::{Days, NaiveDate};

use crate::{error::ConversionError, models::BsDate};

const FIRST_BS_YEAR: i32 = 2070;

/// 1 Baisakh 2070 BS.
const ANCHOR_AD: (i32, u32, u32) = (2013, 4, 14);

#[rustfmt::skip]
const MONTH_LENGTHS: [[u8; 12]; 21] = [
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30], // 2070
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2071
    [31, 32, 31, 32, 31, 30, 30, 29, 30, 29, 30, 30], // 2072
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31], // 2073
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30], // 2074
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2075
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30], // 2076
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31], // 2077
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30], // 2078
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2079
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30], // 2080
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31], // 2081
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30], // 2082
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30], // 2083
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30], // 2084
    [31, 32, 31, 32, 30, 31, 30, 30, 29, 30, 30, 30], // 2085
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2086
    [31, 31, 32, 31, 31, 31, 30, 30, 29, 30, 30, 30], // 2087
    [30, 31, 32, 32, 30, 31, 30, 30, 29, 30, 30, 30], // 2088
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2089
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2090
];

const LAST_BS_YEAR: i32 = FIRST_BS_YEAR + MONTH_LENGTHS.len() as i32 - 1;

/// BS years covered by the conversion table.
pub fn supported_years() -> RangeInclusive<i32> {
    FIRST_BS_YEAR..=LAST_BS_YEAR
}

fn anchor() -> NaiveDate {
    let (year, month, day) = ANCHOR_AD;
    NaiveDate::from_ymd_opt(year, month, day).expect("conversion anchor is a valid date")
}

fn year_row(year: i32) -> Result<&'static [u8; 12], ConversionError> {
    if !supported_years().contains(&year) {
        return Err(ConversionError::YearOutOfRange {
            year,
            min: FIRST_BS_YEAR,
            max: LAST_BS_YEAR,
        });
    }
    Ok(&MONTH_LENGTHS[(year - FIRST_BS_YEAR) as usize])
}

fn year_length(row: &[u8; 12]) -> u64 {
    row.iter().map(|&days| u64::from(days)).sum()
}

/// Number of days in a BS month.
pub fn days_in_month(year: i32, month: u32) -> Result<u32, ConversionError> {
    if !(1..=12).contains(&month) {
        return Err(ConversionError::InvalidMonth(month));
    }
    let row = year_row(year)?;
    Ok(u32::from(row[(month - 1) as usize]))
}

/// Converts a BS date to its Gregorian equivalent.
pub fn bs_to_ad(date: BsDate) -> Result<NaiveDate, ConversionError> {
    let max = days_in_month(date.year, date.month)?;
    if date.day < 1 || date.day > max {
        return Err(ConversionError::InvalidDay {
            year: date.year,
            month: date.month,
            day: date.day,
            max,
        });
    }

    let mut offset: u64 = (FIRST_BS_YEAR..date.year)
        .map(|year| MONTH_LENGTHS[(year - FIRST_BS_YEAR) as usize])
        .map(|row| year_length(&row))
        .sum();
    let row = year_row(date.year)?;
    offset += row[..(date.month - 1) as usize]
        .iter()
        .map(|&days| u64::from(days))
        .sum::<u64>();
    offset += u64::from(date.day - 1);

    anchor()
        .checked_add_days(Days::new(offset))
        .ok_or(ConversionError::DateOutOfRange(anchor()))
}

/// Converts a Gregorian date to BS.
pub fn ad_to_bs(date: NaiveDate) -> Result<BsDate, ConversionError> {
    let offset = (date - anchor()).num_days();
    if offset < 0 {
        return Err(ConversionError::DateOutOfRange(date));
    }

    let mut remaining = offset as u64;
    for (index, row) in MONTH_LENGTHS.iter().enumerate() {
        let length = year_length(row);
        if remaining >= length {
            remaining -= length;
            continue;
        }
        for (month_index, &days) in row.iter().enumerate() {
            let days = u64::from(days);
            if remaining < days {
                return Ok(BsDate::new(
                    FIRST_BS_YEAR + index as i32,
                    month_index as u32 + 1,
                    remaining as u32 + 1,
                ));
            }
            remaining -= days;
        }
    }

    Err(ConversionError::DateOutOfRange(date))
}
