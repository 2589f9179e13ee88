//! Attendance point values per school day, with staff calendar overrides.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Base value of a special event day before bonus and multiplier.
const SPECIAL_EVENT_BASE_POINTS: i64 = 5;

/// Kind of staff-defined calendar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Special,
    NoSchool,
    Break,
    Custom,
    Default,
}

impl EventType {
    fn default_title(self) -> &'static str {
        match self {
            EventType::NoSchool => "No School",
            EventType::Break => "Holiday Break",
            EventType::Special | EventType::Custom | EventType::Default => "Manual Adjustment",
        }
    }
}

/// Staff override for a single calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarOverride {
    pub date: NaiveDate,
    pub title: String,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_multiplier: Option<f64>,
}

impl CalendarOverride {
    pub fn new(date: NaiveDate, title: impl Into<String>, event_type: EventType) -> Self {
        Self {
            date,
            title: title.into(),
            event_type,
            override_points: None,
            bonus_points: None,
            point_multiplier: None,
        }
    }

    fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.title.trim().is_empty() {
            fallback
        } else {
            &self.title
        }
    }
}

/// How a day's points were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayClassification {
    NoSchool,
    Break,
    Custom,
    Special,
    Weekend,
    StandardLow,
    StandardHigh,
}

impl DayClassification {
    pub const fn label(self) -> &'static str {
        match self {
            DayClassification::NoSchool => "no_school",
            DayClassification::Break => "break",
            DayClassification::Custom => "custom",
            DayClassification::Special => "special",
            DayClassification::Weekend => "weekend",
            DayClassification::StandardLow => "standard_low",
            DayClassification::StandardHigh => "standard_high",
        }
    }
}

/// Points a present student earns on a date, with the reason shown on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPoints {
    pub points: i64,
    pub reason: String,
    pub classification: DayClassification,
}

impl DayPoints {
    fn new(points: i64, reason: impl Into<String>, classification: DayClassification) -> Self {
        Self {
            points,
            reason: reason.into(),
            classification,
        }
    }
}

/// Staff edit applied to one or more dates from the calendar screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEdit {
    #[serde(default)]
    pub title: String,
    pub event_type: EventType,
    #[serde(default)]
    pub override_points: Option<i64>,
}

/// Override set keyed by date; at most one override per date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CalendarOverride>", into = "Vec<CalendarOverride>")]
pub struct CalendarOverrides {
    entries: BTreeMap<NaiveDate, CalendarOverride>,
}

impl CalendarOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&CalendarOverride> {
        self.entries.get(&date)
    }

    /// Stores the override, returning the one it replaced for the same date.
    pub fn upsert(&mut self, entry: CalendarOverride) -> Option<CalendarOverride> {
        self.entries.insert(entry.date, entry)
    }

    pub fn remove(&mut self, date: NaiveDate) -> Option<CalendarOverride> {
        self.entries.remove(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarOverride> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the overrides of every listed date with the edit.
    ///
    /// A `default` edit without a title clears the dates. Override points are
    /// only kept for `custom` edits and default to zero there.
    pub fn apply_edit(&mut self, dates: &[NaiveDate], edit: &DayEdit) {
        let clears = edit.event_type == EventType::Default && edit.title.trim().is_empty();

        for date in dates {
            self.entries.remove(date);
            if clears {
                continue;
            }

            let title = if edit.title.trim().is_empty() {
                edit.event_type.default_title().to_string()
            } else {
                edit.title.trim().to_string()
            };

            let mut entry = CalendarOverride::new(*date, title, edit.event_type);
            if edit.event_type == EventType::Custom {
                entry.override_points = Some(edit.override_points.unwrap_or(0));
            }
            self.entries.insert(*date, entry);
        }
    }

    pub fn day_points(&self, date: NaiveDate) -> DayPoints {
        day_points(date, self)
    }
}

impl From<Vec<CalendarOverride>> for CalendarOverrides {
    fn from(values: Vec<CalendarOverride>) -> Self {
        let mut overrides = Self::new();
        for value in values {
            overrides.upsert(value);
        }
        overrides
    }
}

impl From<CalendarOverrides> for Vec<CalendarOverride> {
    fn from(value: CalendarOverrides) -> Self {
        value.entries.into_values().collect()
    }
}

/// Computes the attendance points for `date`.
pub fn day_points(date: NaiveDate, overrides: &CalendarOverrides) -> DayPoints {
    if let Some(entry) = overrides.get(date) {
        match entry.event_type {
            EventType::NoSchool => {
                return DayPoints::new(
                    0,
                    entry.title_or("No School"),
                    DayClassification::NoSchool,
                );
            }
            EventType::Break => {
                return DayPoints::new(
                    0,
                    entry.title_or("Holiday Break"),
                    DayClassification::Break,
                );
            }
            _ => {}
        }

        if let Some(points) = entry.override_points {
            return DayPoints::new(
                points,
                entry.title_or("Manual Adjustment"),
                DayClassification::Custom,
            );
        }

        let bonus = entry.bonus_points.filter(|bonus| *bonus != 0);
        if entry.event_type == EventType::Special || bonus.is_some() {
            // Zero or non-finite multipliers count as no multiplier.
            let multiplier = entry
                .point_multiplier
                .filter(|multiplier| *multiplier != 0.0 && multiplier.is_finite())
                .unwrap_or(1.0);
            let base = SPECIAL_EVENT_BASE_POINTS.saturating_add(bonus.unwrap_or(0));
            let total = base as f64 * multiplier;
            return DayPoints::new(
                total.round() as i64,
                format!("Special Event: {}", entry.title),
                DayClassification::Special,
            );
        }
    }

    match date.weekday() {
        Weekday::Sat | Weekday::Sun => DayPoints::new(0, "No School", DayClassification::Weekend),
        Weekday::Mon => DayPoints::new(2, "Motivation Monday", DayClassification::StandardLow),
        Weekday::Fri => DayPoints::new(5, "Focus Friday", DayClassification::StandardHigh),
        Weekday::Tue | Weekday::Wed | Weekday::Thu => {
            DayPoints::new(1, "Daily Attendance", DayClassification::StandardLow)
        }
    }
}

/// Parses `YYYY-MM-DD` from its calendar components.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        parse_calendar_date(raw).expect("valid date")
    }

    #[test]
    fn unmarked_weekdays_follow_the_weekly_schedule() {
        let overrides = CalendarOverrides::new();
        // 2025-10-13 is a Monday.
        let expected = [2, 1, 1, 1, 5, 0, 0];
        for (offset, points) in expected.iter().enumerate() {
            let day = date("2025-10-13") + chrono::Duration::days(offset as i64);
            assert_eq!(day_points(day, &overrides).points, *points, "{day}");
        }
        assert_eq!(
            day_points(date("2025-10-18"), &overrides).classification,
            DayClassification::Weekend
        );
        assert_eq!(
            day_points(date("2025-10-17"), &overrides).reason,
            "Focus Friday"
        );
    }

    #[test]
    fn closures_zero_out_any_weekday() {
        let mut overrides = CalendarOverrides::new();
        let mut closure = CalendarOverride::new(date("2025-10-17"), "", EventType::NoSchool);
        closure.override_points = Some(40);
        closure.bonus_points = Some(10);
        overrides.upsert(closure);
        overrides.upsert(CalendarOverride::new(
            date("2025-12-22"),
            "Winter Break",
            EventType::Break,
        ));

        let friday = day_points(date("2025-10-17"), &overrides);
        assert_eq!(friday.points, 0);
        assert_eq!(friday.classification, DayClassification::NoSchool);
        assert_eq!(friday.reason, "No School");

        let monday = day_points(date("2025-12-22"), &overrides);
        assert_eq!(monday.points, 0);
        assert_eq!(monday.classification, DayClassification::Break);
        assert_eq!(monday.reason, "Winter Break");
    }

    #[test]
    fn override_points_are_returned_verbatim_even_on_weekends() {
        let mut overrides = CalendarOverrides::new();
        let mut entry = CalendarOverride::new(date("2025-10-18"), "Saturday Workshop", EventType::Custom);
        entry.override_points = Some(7);
        overrides.upsert(entry);

        let result = day_points(date("2025-10-18"), &overrides);
        assert_eq!(result.points, 7);
        assert_eq!(result.classification, DayClassification::Custom);
        assert_eq!(result.reason, "Saturday Workshop");
    }

    #[test]
    fn special_events_apply_bonus_and_multiplier() {
        let mut overrides = CalendarOverrides::new();
        let mut halloween = CalendarOverride::new(
            date("2023-10-31"),
            "Halloween Costume Day",
            EventType::Special,
        );
        halloween.bonus_points = Some(10);
        overrides.upsert(halloween);

        let mut spirit = CalendarOverride::new(date("2025-10-15"), "Spirit Day", EventType::Default);
        spirit.bonus_points = Some(1);
        spirit.point_multiplier = Some(2.0);
        overrides.upsert(spirit);

        let plain = CalendarOverride::new(date("2025-10-16"), "Assembly", EventType::Special);
        overrides.upsert(plain);

        let result = day_points(date("2023-10-31"), &overrides);
        assert_eq!(result.points, 15);
        assert_eq!(result.reason, "Special Event: Halloween Costume Day");
        assert_eq!(day_points(date("2025-10-15"), &overrides).points, 12);
        assert_eq!(day_points(date("2025-10-16"), &overrides).points, 5);
    }

    #[test]
    fn zero_or_invalid_multiplier_scores_as_one() {
        let mut overrides = CalendarOverrides::new();
        let mut zero = CalendarOverride::new(date("2025-10-15"), "Spirit Day", EventType::Special);
        zero.point_multiplier = Some(0.0);
        overrides.upsert(zero);

        let mut broken = CalendarOverride::new(date("2025-10-16"), "Pep Rally", EventType::Special);
        broken.bonus_points = Some(2);
        broken.point_multiplier = Some(f64::NAN);
        overrides.upsert(broken);

        assert_eq!(day_points(date("2025-10-15"), &overrides).points, 5);
        assert_eq!(day_points(date("2025-10-16"), &overrides).points, 7);
    }

    #[test]
    fn titled_default_entry_without_bonus_uses_weekday_rules() {
        let mut overrides = CalendarOverrides::new();
        let mut entry = CalendarOverride::new(date("2025-10-14"), "Picture Day", EventType::Default);
        entry.bonus_points = Some(0);
        overrides.upsert(entry);

        let result = day_points(date("2025-10-14"), &overrides);
        assert_eq!(result.points, 1);
        assert_eq!(result.classification, DayClassification::StandardLow);
    }

    #[test]
    fn bulk_edit_keeps_one_override_per_date() {
        let mut overrides = CalendarOverrides::new();
        let dates = [date("2025-11-26"), date("2025-11-27")];
        overrides.apply_edit(
            &dates,
            &DayEdit {
                title: String::new(),
                event_type: EventType::Break,
                override_points: Some(9),
            },
        );
        overrides.apply_edit(
            &dates[1..],
            &DayEdit {
                title: "Makeup Day".to_string(),
                event_type: EventType::Custom,
                override_points: None,
            },
        );

        assert_eq!(overrides.len(), 2);
        let first = overrides.get(dates[0]).expect("first date stored");
        assert_eq!(first.title, "Holiday Break");
        assert_eq!(first.override_points, None);
        let second = overrides.get(dates[1]).expect("second date stored");
        assert_eq!(second.event_type, EventType::Custom);
        assert_eq!(second.override_points, Some(0));
    }

    #[test]
    fn default_edit_without_title_clears_dates() {
        let mut overrides = CalendarOverrides::new();
        overrides.upsert(CalendarOverride::new(
            date("2025-10-20"),
            "Teacher In-Service",
            EventType::NoSchool,
        ));
        overrides.apply_edit(
            &[date("2025-10-20")],
            &DayEdit {
                title: "  ".to_string(),
                event_type: EventType::Default,
                override_points: None,
            },
        );
        assert!(overrides.is_empty());
    }

    #[test]
    fn serializes_as_a_list_and_deduplicates_on_load() {
        let raw = r#"[
            {"date":"2025-10-20","title":"First","event_type":"special"},
            {"date":"2025-10-20","title":"Second","event_type":"no_school"}
        ]"#;
        let overrides: CalendarOverrides = serde_json::from_str(raw).expect("parse overrides");
        assert_eq!(overrides.len(), 1);
        assert_eq!(
            overrides.get(date("2025-10-20")).map(|entry| entry.title.as_str()),
            Some("Second")
        );

        let encoded = serde_json::to_value(&overrides).expect("encode overrides");
        assert!(encoded.is_array());
    }

    #[test]
    fn parse_rejects_malformed_dates() {
        assert!(parse_calendar_date("2025-13-01").is_err());
        assert!(parse_calendar_date("10/17/2025").is_err());
        assert_eq!(
            parse_calendar_date(" 2025-10-17 ").expect("trimmed").weekday(),
            Weekday::Fri
        );
    }
}
