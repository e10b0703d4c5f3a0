use chrono::{NaiveDate, Timelike, Utc};
use std::sync::Arc;

use super::{Coordinate, SolarClock};
use crate::constants::test_constants::*;
use crate::core::ScheduleError;
use crate::time_source::{ManualTimeSource, TimeSource, parse_datetime};

fn clock_at(datetime: &str) -> Arc<ManualTimeSource> {
    Arc::new(ManualTimeSource::new(parse_datetime(datetime).unwrap()))
}

fn tel_aviv(clock: Arc<ManualTimeSource>) -> SolarClock {
    SolarClock::new(
        Coordinate::new(TEL_AVIV_LATITUDE, TEL_AVIV_LONGITUDE),
        clock,
    )
}

#[test]
fn test_tel_aviv_summer_solstice() {
    let solar = tel_aviv(clock_at("2024-06-21 12:00:00"));
    let date = NaiveDate::from_ymd_opt(2024, 6, 21);

    // Sunset is around 16:49 UTC, sunrise around 02:33 UTC
    let sunset = solar.sunset_at(date).unwrap().with_timezone(&Utc);
    let sunrise = solar.sunrise_at(date).unwrap().with_timezone(&Utc);

    assert_eq!(sunset.hour(), 16);
    assert_eq!(sunrise.hour(), 2);
    assert!(sunrise < sunset);
}

#[test]
fn test_tel_aviv_winter_solstice() {
    let solar = tel_aviv(clock_at("2024-12-21 12:00:00"));
    let sunset = solar
        .sunset_at(NaiveDate::from_ymd_opt(2024, 12, 21))
        .unwrap()
        .with_timezone(&Utc);

    // Around 14:40 UTC
    assert_eq!(sunset.hour(), 14);
}

#[test]
fn test_omitted_date_uses_clock_today() {
    let clock = clock_at("2024-06-21 12:00:00");
    let solar = tel_aviv(clock.clone());

    let explicit = solar.sunset_at(Some(clock.now().date_naive())).unwrap();
    let implicit = solar.sunset_at(None).unwrap();

    assert_eq!(explicit, implicit);
}

#[test]
fn test_results_truncated_to_whole_seconds() {
    let solar = tel_aviv(clock_at("2024-03-01 12:00:00"));
    let sunset = solar.sunset_at(None).unwrap();
    assert_eq!(sunset.nanosecond(), 0);
}

#[test]
fn test_polar_night_is_a_geolocation_error() {
    let solar = SolarClock::new(
        Coordinate::new(LONGYEARBYEN_LATITUDE, LONGYEARBYEN_LONGITUDE),
        clock_at("2024-12-21 12:00:00"),
    );

    let err = solar.sunset_at(None).unwrap_err();
    match err {
        ScheduleError::Geolocation { date, reason, .. } => {
            assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 21).unwrap());
            assert!(reason.contains("polar night"));
        }
        other => panic!("expected geolocation error, got {other:?}"),
    }
}

#[test]
fn test_midnight_sun_is_a_geolocation_error() {
    let solar = SolarClock::new(
        Coordinate::new(LONGYEARBYEN_LATITUDE, LONGYEARBYEN_LONGITUDE),
        clock_at("2024-06-21 12:00:00"),
    );

    let err = solar.sunrise_at(None).unwrap_err();
    assert!(err.to_string().contains("midnight sun"));
}

#[test]
fn test_coordinate_display() {
    assert_eq!(
        Coordinate::new(32.0853, 34.781769).to_string(),
        "32.085°N, 34.782°E"
    );
    assert_eq!(
        Coordinate::new(-33.9249, -18.4241).to_string(),
        "33.925°S, 18.424°W"
    );
}
