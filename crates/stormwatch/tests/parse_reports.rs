//! End-to-end decoding through the public API.

use stormwatch::metar::wind::COMPASS_POINTS;
use stormwatch::metar::{self, compass_label, CloudCover, PressureUnit};
use stormwatch::{MetarError, WeatherReport};

#[test]
fn kingston_report() {
    let obs = metar::parse("MKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012").unwrap();

    assert_eq!(obs.station, "MKJP");
    assert_eq!(obs.wind.direction_degrees(), Some(90));
    assert_eq!(obs.wind.compass_label(), "E");
    assert_eq!(obs.wind.speed(), Some(10));
    assert_eq!(obs.wind.gust(), None);
    assert_eq!(obs.visibility.description(), "10+ km");
    assert_eq!(obs.clouds, CloudCover::Few);
    assert_eq!(obs.clouds.label(), "Few clouds");
    assert_eq!((obs.temperature_c(), obs.temperature_f()), (Some(30), Some(86)));
    assert_eq!((obs.dew_point_c(), obs.dew_point_f()), (Some(24), Some(75)));

    let pressure = obs.pressure.value().unwrap();
    assert_eq!(pressure.value, "1012");
    assert_eq!(pressure.unit, PressureUnit::Hectopascals);
}

#[test]
fn gusting_report_with_missing_groups() {
    let obs = metar::parse("MKJP 151200Z 27025G40KT ////  BKN010 ////  A2992").unwrap();

    assert_eq!(obs.wind.direction_degrees(), Some(270));
    assert_eq!(obs.wind.speed(), Some(25));
    assert_eq!(obs.wind.gust(), Some(40));
    assert_eq!(obs.visibility.description(), "Unknown");
    assert_eq!(obs.clouds.label(), "Broken clouds");
    assert_eq!(obs.temperature_c(), None);
    assert_eq!(obs.temperature_f(), None);
    assert_eq!(obs.dew_point_c(), None);
    assert_eq!(obs.dew_point_f(), None);

    let pressure = obs.pressure.value().unwrap();
    assert_eq!(pressure.value, "2992");
    assert_eq!(pressure.unit, PressureUnit::InchesOfMercury);
}

#[test]
fn empty_input_is_an_error() {
    assert_eq!(metar::parse(""), Err(MetarError::Empty));
    assert_eq!(metar::parse(" \n\t "), Err(MetarError::Empty));
}

#[test]
fn gust_is_null_not_zero() {
    let obs = metar::parse("MKJP 151200Z 09010KT 9999").unwrap();
    let json = serde_json::to_value(&obs).unwrap();
    assert!(json["wind"]["gust"].is_null());

    let obs = metar::parse("MKJP 151200Z 09010G22KT 9999").unwrap();
    let json = serde_json::to_value(&obs).unwrap();
    assert_eq!(json["wind"]["gust"], 22);
}

#[test]
fn variable_wind() {
    let obs = metar::parse("MKJP 151200Z VRB05KT 9999 SKC 28/20 Q1015").unwrap();
    assert_eq!(obs.wind.direction_degrees(), None);
    assert_eq!(obs.wind.compass_label(), "Variable");
    assert_eq!(obs.wind.speed(), Some(5));
    assert_eq!(obs.clouds.label(), "Sky clear");
}

#[test]
fn every_degree_has_one_compass_point() {
    for degrees in 0..=360 {
        assert!(COMPASS_POINTS.contains(&compass_label(degrees)));
    }
    assert_eq!(compass_label(0), "N");
    assert_eq!(compass_label(360), "N");
    assert_eq!(compass_label(180), "S");
    assert_eq!(compass_label(225), "SW");
}

#[test]
fn visibility_descriptions() {
    let describe = |token: &str| {
        metar::parse(&format!("MKJP 151200Z 09010KT {token}"))
            .unwrap()
            .visibility
            .description()
    };
    assert_eq!(describe("9999"), "10+ km");
    assert_eq!(describe("////"), "Unknown");
    assert_eq!(describe("4000"), "4 km");
    assert_eq!(describe("0800"), "0.8 km");
}

#[test]
fn missing_and_malformed_are_distinct() {
    let missing = metar::parse("MKJP 151200Z ///// 9999 FEW020 ///// Q1012").unwrap();
    assert!(missing.wind.direction.is_missing());
    assert!(missing.temperatures.air.is_missing());

    let malformed = metar::parse("MKJP 151200Z 9X010KT 9999 FEW020 3O/24 Q1012").unwrap();
    assert!(malformed.wind.direction.is_malformed());
    assert!(malformed.temperatures.air.is_malformed());
    assert_eq!(malformed.dew_point_c(), Some(24));
}

#[test]
fn weather_report_wire_envelope() {
    let raw = "MKJP 151200Z 09010KT 9999 FEW020 30/24 Q1012";
    let report = WeatherReport::new(
        raw,
        metar::parse(raw).unwrap(),
        "Kingston/Norman Manley International Airport",
        chrono::Utc::now(),
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["raw"], raw);
    assert_eq!(
        json["summary"],
        "86°F with few clouds. Winds from the E at 10 knots. Visibility 10+ km."
    );
    assert_eq!(json["parsed"]["wind"]["description"], "E");
    assert_eq!(json["parsed"]["dewPoint"]["fahrenheit"], 75);
    assert_eq!(json["parsed"]["pressure"]["unit"], "hPa");
    assert!(json["fetchedAt"].is_string());
}
