use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use repdesk_core::calendar::{self, DateRange};
use repdesk_reporting::{RecordFilter, ReportQuery, SortOrder};
use repdesk_sales::Factory;

use axum::http::StatusCode;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FollowUpRequest {
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryRequest {
    pub manual: bool,
    #[serde(default, with = "calendar::serde_day::option")]
    pub date: Option<NaiveDate>,
}

/// Query parameters of the listing routes. Everything is optional and kept
/// raw so malformed values produce JSON errors.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub factory: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Query parameters of the report routes.
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub factory: Option<String>,
}

// -------------------------
// Parsing helpers
// -------------------------

type Rejection = axum::response::Response;

impl ListParams {
    /// Filter built from the parameters; no window unless `start` or `end`
    /// is given.
    pub fn filter<S: DeserializeOwned + Copy + PartialEq>(
        &self,
        today: NaiveDate,
    ) -> Result<RecordFilter<S>, Rejection> {
        let range = if self.start.is_some() || self.end.is_some() {
            Some(parse_range(self.start.as_deref(), self.end.as_deref(), today)?)
        } else {
            None
        };
        Ok(RecordFilter {
            range,
            factory: parse_factory(self.factory.as_deref())?,
            status: parse_status(self.status.as_deref())?,
            search: self.search.clone(),
        })
    }

    pub fn sort_order(&self) -> Result<SortOrder, Rejection> {
        match self.sort.as_deref().map(str::trim) {
            None | Some("") => Ok(SortOrder::default()),
            Some(raw) => parse_enum(raw, "invalid_sort", "sort must be asc or desc"),
        }
    }
}

impl ReportParams {
    /// Report window, defaulting to the current month.
    pub fn query(&self, today: NaiveDate) -> Result<ReportQuery, Rejection> {
        Ok(ReportQuery::new(
            parse_range(self.start.as_deref(), self.end.as_deref(), today)?,
            parse_factory(self.factory.as_deref())?,
        ))
    }
}

/// A missing start is the first day of the current month; a missing end is
/// the last day of the start's month.
pub fn parse_range(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Result<DateRange, Rejection> {
    let start = match start {
        Some(raw) => parse_day(raw)?,
        None => calendar::start_of_month(today),
    };
    let end = match end {
        Some(raw) => parse_day(raw)?,
        None => calendar::end_of_month(start),
    };
    if end < start {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_range",
            "end must not be before start",
        ));
    }
    Ok(DateRange::new(start, end))
}

pub fn parse_day(raw: &str) -> Result<NaiveDate, Rejection> {
    calendar::parse_day(raw.trim()).map_err(errors::domain_error_to_response)
}

pub fn parse_factory(raw: Option<&str>) -> Result<Option<Factory>, Rejection> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name
            .parse()
            .map(Some)
            .map_err(errors::domain_error_to_response),
    }
}

/// Status names use the stored vocabulary (e.g. `Fechado`, `Faturado`).
pub fn parse_status<S: DeserializeOwned>(raw: Option<&str>) -> Result<Option<S>, Rejection> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => parse_enum(name, "invalid_status", format!("unknown status {name:?}")).map(Some),
    }
}

fn parse_enum<T: DeserializeOwned>(
    raw: &str,
    code: &'static str,
    message: impl Into<String>,
) -> Result<T, Rejection> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use repdesk_sales::{OrderStatus, QuoteStatus};

    fn day(s: &str) -> NaiveDate {
        calendar::parse_day(s).unwrap()
    }

    #[test]
    fn range_defaults_to_current_month() {
        let range = parse_range(None, None, day("2024-02-10")).unwrap();
        assert_eq!(range, DateRange::new(day("2024-02-01"), day("2024-02-29")));

        let range = parse_range(Some("2024-03-05"), None, day("2024-02-10")).unwrap();
        assert_eq!(range.end, day("2024-03-31"));
    }

    #[test]
    fn inverted_or_malformed_ranges_are_rejected() {
        let today = day("2024-02-10");
        assert!(parse_range(Some("2024-03-05"), Some("2024-03-01"), today).is_err());
        assert!(parse_range(Some("05/03/2024"), None, today).is_err());
    }

    #[test]
    fn statuses_use_stored_names() {
        assert_eq!(parse_status::<QuoteStatus>(Some("Fechado")).unwrap(), Some(QuoteStatus::Closed));
        assert_eq!(parse_status::<OrderStatus>(Some(" ")).unwrap(), None);
        assert!(parse_status::<OrderStatus>(Some("Closed")).is_err());
    }

    #[test]
    fn list_params_without_dates_have_no_window() {
        let params = ListParams {
            factory: Some("MGM".into()),
            ..ListParams::default()
        };
        let filter: RecordFilter<QuoteStatus> = params.filter(day("2024-02-10")).unwrap();
        assert_eq!(filter.range, None);
        assert_eq!(filter.factory, Some(Factory::Mgm));
        assert_eq!(params.sort_order().unwrap(), SortOrder::Descending);
    }

    #[test]
    fn delivery_dates_must_use_the_boundary_format() {
        let body: DeliveryRequest =
            serde_json::from_str(r#"{"manual":true,"date":"2024-03-30"}"#).unwrap();
        assert_eq!(body.date, Some(day("2024-03-30")));

        let body: DeliveryRequest = serde_json::from_str(r#"{"manual":false}"#).unwrap();
        assert_eq!(body.date, None);

        assert!(
            serde_json::from_str::<DeliveryRequest>(r#"{"manual":true,"date":"+262142-12-31"}"#)
                .is_err()
        );
    }
}
