//! Records returned by the Spring project and calendar APIs.
//!
//! Field names follow the upstream JSON (camelCase). Unknown fields are
//! ignored so upstream additions do not break decoding.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A single release of a Spring project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Version string, e.g. `3.2.0`.
    pub version: String,
    /// Release status as reported upstream, e.g. `GA`, `SNAPSHOT`, `PRERELEASE`.
    pub status: String,
    /// Whether this is the project's current release.
    pub current: bool,
}

/// A support lifecycle window for one release line of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    /// Release line, e.g. `3.2.x`.
    pub name: String,
    /// First release date of the line.
    #[serde(default, deserialize_with = "deserialize_optional_calendar_date")]
    pub initial_release_date: Option<NaiveDate>,
    /// End of open-source support.
    #[serde(default, deserialize_with = "deserialize_optional_calendar_date")]
    pub oss_support_end_date: Option<NaiveDate>,
    /// End of commercial support.
    #[serde(default, deserialize_with = "deserialize_optional_calendar_date")]
    pub commercial_support_end_date: Option<NaiveDate>,
}

impl Generation {
    /// Returns `true` unless two present dates are out of order.
    ///
    /// Expected order: initial release, OSS end, commercial end. Missing
    /// dates are skipped.
    #[must_use]
    pub fn is_chronological(&self) -> bool {
        let dates: Vec<NaiveDate> = [
            self.initial_release_date,
            self.oss_support_end_date,
            self.commercial_support_end_date,
        ]
        .into_iter()
        .flatten()
        .collect();

        dates.windows(2).all(|pair| pair[0] <= pair[1])
    }
}

/// An entry of the release calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingRelease {
    /// Calendar "all day" flag.
    #[serde(default)]
    pub all_day: bool,
    /// Display colour used by the calendar.
    #[serde(default)]
    pub background_color: String,
    /// Planned release date.
    #[serde(deserialize_with = "deserialize_calendar_date")]
    pub start: NaiveDate,
    /// Project and version, e.g. `Spring Boot 3.3.0`.
    #[serde(default)]
    pub title: String,
    /// Link to the release milestone.
    #[serde(default)]
    pub url: String,
}

/// Parses `YYYY-MM-DD`, keeping only the date part of a full timestamp such
/// as `2024-05-23T00:00:00+02:00`.
fn deserialize_calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).map_err(serde::de::Error::custom)
}

/// Like [`deserialize_calendar_date`], with `null` decoding to `None`.
fn deserialize_optional_calendar_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_calendar_date(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

/// Parses a calendar date from a date or timestamp string.
///
/// # Errors
///
/// Returns a message if the leading `YYYY-MM-DD` is not a valid date.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split_once(['T', ' '])
        .map_or(trimmed, |(date, _)| date);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| format!("invalid calendar date '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn release_ignores_unknown_fields() {
        let json = r#"{
            "version": "3.2.0",
            "status": "GA",
            "current": true,
            "referenceDocUrl": "https://docs.spring.io/spring-boot/docs/3.2.0/reference/html/",
            "_links": { "self": { "href": "https://api.spring.io/projects/spring-boot/releases/3.2.0" } }
        }"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(
            release,
            Release {
                version: "3.2.0".to_string(),
                status: "GA".to_string(),
                current: true,
            }
        );
    }

    #[test]
    fn release_requires_all_fields() {
        let json = r#"{ "version": "3.2.0", "status": "GA" }"#;
        assert!(serde_json::from_str::<Release>(json).is_err());
    }

    #[test]
    fn generation_requires_name() {
        let json = r#"{ "initialReleaseDate": "2023-11-23" }"#;
        assert!(serde_json::from_str::<Generation>(json).is_err());
    }

    #[test]
    fn generation_dates_are_nullable() {
        let json = r#"{
            "name": "3.3.x",
            "initialReleaseDate": "2024-05-23",
            "ossSupportEndDate": null
        }"#;
        let generation: Generation = serde_json::from_str(json).unwrap();
        assert_eq!(generation.initial_release_date, Some(date(2024, 5, 23)));
        assert_eq!(generation.oss_support_end_date, None);
        assert_eq!(generation.commercial_support_end_date, None);
        assert!(generation.is_chronological());
    }

    #[test]
    fn generation_dates_accept_timestamps() {
        let json = r#"{
            "name": "3.2.x",
            "initialReleaseDate": "2023-11-23T00:00:00Z",
            "ossSupportEndDate": "2024-11-23",
            "commercialSupportEndDate": "2026-02-23T00:00:00+01:00"
        }"#;
        let generation: Generation = serde_json::from_str(json).unwrap();
        assert_eq!(generation.initial_release_date, Some(date(2023, 11, 23)));
        assert_eq!(generation.oss_support_end_date, Some(date(2024, 11, 23)));
        assert_eq!(generation.commercial_support_end_date, Some(date(2026, 2, 23)));

        let json = r#"{ "name": "3.2.x", "ossSupportEndDate": "soon" }"#;
        assert!(serde_json::from_str::<Generation>(json).is_err());
    }

    #[test]
    fn generation_order_check() {
        let mut generation = Generation {
            name: "3.2.x".to_string(),
            initial_release_date: Some(date(2023, 11, 23)),
            oss_support_end_date: Some(date(2024, 11, 23)),
            commercial_support_end_date: Some(date(2026, 2, 23)),
        };
        assert!(generation.is_chronological());

        generation.commercial_support_end_date = Some(date(2024, 1, 1));
        assert!(!generation.is_chronological());

        // Gaps are skipped, the remaining pair is still compared.
        generation.oss_support_end_date = None;
        generation.commercial_support_end_date = Some(date(2023, 1, 1));
        assert!(!generation.is_chronological());
    }

    #[test]
    fn upcoming_release_start_accepts_timestamp() {
        let json = r##"{
            "allDay": true,
            "backgroundColor": "#6db33f",
            "start": "2024-05-23T00:00:00+02:00",
            "title": "Spring Boot 3.3.0",
            "url": "https://github.com/spring-projects/spring-boot/milestone/1"
        }"##;
        let upcoming: UpcomingRelease = serde_json::from_str(json).unwrap();
        assert_eq!(upcoming.start, date(2024, 5, 23));
        assert!(upcoming.all_day);
        assert_eq!(upcoming.title, "Spring Boot 3.3.0");
    }

    #[test]
    fn upcoming_release_rejects_bad_start() {
        let json = r#"{ "start": "next tuesday", "title": "x" }"#;
        assert!(serde_json::from_str::<UpcomingRelease>(json).is_err());
    }

    #[test]
    fn parse_calendar_date_variants() {
        assert_eq!(parse_calendar_date("2024-02-29").unwrap(), date(2024, 2, 29));
        assert_eq!(
            parse_calendar_date("2024-02-29 10:00:00").unwrap(),
            date(2024, 2, 29)
        );
        assert!(parse_calendar_date("2023-02-29").is_err());
    }

    #[test]
    fn records_survive_reencoding() {
        let release: Release =
            serde_json::from_str(r#"{"version":"6.1.0-M1","status":"PRERELEASE","current":false}"#)
                .unwrap();
        let again: Release =
            serde_json::from_str(&serde_json::to_string(&release).unwrap()).unwrap();
        assert_eq!(release, again);

        let generation: Generation = serde_json::from_str(
            r#"{"name":"6.1.x","initialReleaseDate":"2023-11-16","ossSupportEndDate":"2024-11-15","commercialSupportEndDate":"2026-02-15"}"#,
        )
        .unwrap();
        let encoded = serde_json::to_value(&generation).unwrap();
        assert_eq!(encoded["ossSupportEndDate"], "2024-11-15");
        let again: Generation = serde_json::from_value(encoded).unwrap();
        assert_eq!(generation, again);

        let upcoming: UpcomingRelease = serde_json::from_str(
            r##"{"allDay":true,"backgroundColor":"#6db33f","start":"2024-06-20T08:00:00Z","title":"Spring Framework 6.1.9","url":"https://example.org/m/1"}"##,
        )
        .unwrap();
        let encoded = serde_json::to_value(&upcoming).unwrap();
        assert_eq!(encoded["start"], "2024-06-20");
        assert_eq!(encoded["backgroundColor"], "#6db33f");
        let again: UpcomingRelease = serde_json::from_value(encoded).unwrap();
        assert_eq!(upcoming, again);
    }
}
