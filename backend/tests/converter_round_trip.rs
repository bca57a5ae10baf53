use bida_backend::{error::ConversionError, models::BsDate, services::converter};
use chrono::Days;

#[path = "support/mod.rs"]
mod support;

use support::date;

#[test]
fn every_bs_date_in_the_table_round_trips() {
    let mut previous = None;
    for year in converter::supported_years() {
        for month in 1..=12 {
            let length = converter::days_in_month(year, month).expect("month length");
            for day in 1..=length {
                let bs = BsDate::new(year, month, day);
                let ad = converter::bs_to_ad(bs).expect("convert to AD");
                assert_eq!(converter::ad_to_bs(ad), Ok(bs), "round trip of {}", bs);

                if let Some(previous) = previous {
                    assert_eq!(
                        ad,
                        previous + Days::new(1),
                        "{} does not follow the previous day",
                        bs
                    );
                }
                previous = Some(ad);
            }
        }
    }
}

#[test]
fn known_new_year_dates() {
    let cases = [
        (2070, date(2013, 4, 14)),
        (2073, date(2016, 4, 13)),
        (2077, date(2020, 4, 13)),
        (2081, date(2024, 4, 13)),
        (2082, date(2025, 4, 14)),
    ];
    for (year, expected) in cases {
        assert_eq!(converter::bs_to_ad(BsDate::new(year, 1, 1)), Ok(expected));
    }
}

#[test]
fn tihar_2082_falls_in_kartik() {
    assert_eq!(
        converter::ad_to_bs(date(2025, 10, 21)),
        Ok(BsDate::new(2082, 7, 5))
    );
    assert_eq!(
        converter::ad_to_bs(date(2025, 11, 15)),
        Ok(BsDate::new(2082, 7, 30))
    );
}

#[test]
fn dates_outside_the_table_are_rejected() {
    assert_eq!(
        converter::ad_to_bs(date(2013, 4, 13)),
        Err(ConversionError::DateOutOfRange(date(2013, 4, 13)))
    );
    assert!(matches!(
        converter::bs_to_ad(BsDate::new(2091, 1, 1)),
        Err(ConversionError::YearOutOfRange { year: 2091, .. })
    ));
    assert!(matches!(
        converter::ad_to_bs(date(2040, 1, 1)),
        Err(ConversionError::DateOutOfRange(_))
    ));
}

#[test]
fn invalid_month_and_day_are_rejected() {
    assert_eq!(
        converter::bs_to_ad(BsDate::new(2082, 13, 1)),
        Err(ConversionError::InvalidMonth(13))
    );
    assert!(matches!(
        converter::bs_to_ad(BsDate::new(2082, 9, 32)),
        Err(ConversionError::InvalidDay { day: 32, .. })
    ));
    assert!(matches!(
        converter::bs_to_ad(BsDate::new(2082, 1, 0)),
        Err(ConversionError::InvalidDay { day: 0, .. })
    ));
}
