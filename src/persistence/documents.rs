//! Document shapes written to the store.
//!
//! Field names follow the collections the dashboard reads: `users`, `steps`
//! (one document per user and day) and `days` (one summary per day).

use serde::{Deserialize, Serialize};

use crate::aggregation::{DayAggregate, SufficientStats};
use crate::population::{CalendarDay, UserIdentity, UserSeries};

pub const USERS: &str = "users";
pub const STEPS: &str = "steps";
pub const DAYS: &str = "days";

/// Field of `steps` documents that per-day lookups filter on.
pub const STEPS_DATE_FIELD: &str = "startDateInUTC";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub family_name: String,
    pub given_name: String,
    pub locale: String,
    pub name: String,
    pub verified_email: bool,
    pub picture: String,
}

impl From<&UserIdentity> for UserDocument {
    fn from(user: &UserIdentity) -> Self {
        let p = &user.profile;
        Self {
            id: user.id.to_string(),
            email: p.email.clone(),
            family_name: p.family_name.clone(),
            given_name: p.given_name.clone(),
            locale: p.locale.clone(),
            name: p.name.clone(),
            verified_email: p.verified_email,
            picture: p.picture.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepDocument {
    pub user: String,
    #[serde(rename = "startDateInUTC")]
    pub start_date_ms: i64,
    pub steps: u32,
}

impl StepDocument {
    /// One document per day of `series`.
    pub fn for_series<'a>(
        series: &'a UserSeries,
        days: &'a [CalendarDay],
    ) -> impl Iterator<Item = StepDocument> + 'a {
        let user = series.user.to_string();
        days.iter().zip(&series.steps).map(move |(day, &steps)| StepDocument {
            user: user.clone(),
            start_date_ms: day.timestamp_ms,
            steps,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayDocument {
    #[serde(rename = "dateInUTC")]
    pub date_ms: i64,
    pub mean: f64,
    #[serde(rename = "stdErrorOfMean")]
    pub std_error_of_mean: f64,
    #[serde(rename = "sumsForMeanAndSEM")]
    pub sums: SufficientStats,
}

impl From<&DayAggregate> for DayDocument {
    fn from(day: &DayAggregate) -> Self {
        Self {
            date_ms: day.date_ms,
            mean: day.mean,
            std_error_of_mean: day.std_error_of_mean,
            sums: day.sums,
        }
    }
}

impl From<&DayDocument> for DayAggregate {
    /// Mean and error are re-derived from the stored sums.
    fn from(doc: &DayDocument) -> Self {
        DayAggregate::from_sums(doc.date_ms, doc.sums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_day_document_field_names() {
        let day = DayAggregate::from_values(1_481_500_800_000, &[1000, 3000]);
        let value = serde_json::to_value(DayDocument::from(&day)).unwrap();

        assert_eq!(value["dateInUTC"], json!(1_481_500_800_000i64));
        assert_eq!(value["mean"], json!(2000.0));
        assert_eq!(value["sumsForMeanAndSEM"]["sum0"], json!(2));
        assert_eq!(value["sumsForMeanAndSEM"]["sum1"], json!(4000));
        assert_eq!(value["sumsForMeanAndSEM"]["sum2"], json!(10_000_000));
        assert!(value.get("stdErrorOfMean").is_some());
    }

    #[test]
    fn test_day_document_restores_aggregate() {
        let day = DayAggregate::from_values(0, &[10, 20, 60]);
        let doc = DayDocument::from(&day);
        let text = serde_json::to_string(&doc).unwrap();
        let back: DayDocument = serde_json::from_str(&text).unwrap();

        assert_eq!(DayAggregate::from(&back), day);
    }

    #[test]
    fn test_sums_beyond_u64_are_stored_as_strings() {
        let day = DayAggregate::from_values(0, &[u32::MAX, u32::MAX]);
        assert!(day.sums.sum2 > u64::MAX as u128);

        let value = serde_json::to_value(DayDocument::from(&day)).unwrap();
        assert_eq!(value["sumsForMeanAndSEM"]["sum1"], json!(2 * u32::MAX as u64));
        assert_eq!(value["sumsForMeanAndSEM"]["sum2"], json!(day.sums.sum2.to_string()));

        let back: DayDocument = serde_json::from_value(value).unwrap();
        assert_eq!(DayAggregate::from(&back), day);
    }

    #[test]
    fn test_step_document_field_names() {
        let doc = StepDocument { user: "u".to_string(), start_date_ms: 5, steps: 1200 };
        let value = serde_json::to_value(doc).unwrap();
        assert_eq!(value, json!({ "user": "u", "startDateInUTC": 5, "steps": 1200 }));
    }
}
