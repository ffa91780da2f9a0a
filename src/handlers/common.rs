use std::str::FromStr;

use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::db::paginate::PageRequest;
use crate::errors::ServiceError;

pub fn default_page() -> u64 {
    1
}

/// Builds a normalized page request from raw query values, applying the
/// configured default and ceiling.
pub fn page_request(config: &AppConfig, page: u64, per_page: Option<u64>) -> PageRequest {
    PageRequest::new(
        page,
        per_page.unwrap_or(config.default_page_size),
        config.max_page_size,
    )
}

/// Parses an optional ISO date query parameter. Absent and blank both mean
/// "no filter"; anything else must parse.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, ServiceError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ServiceError::ValidationError(format!(
                    "{} must be an ISO date (YYYY-MM-DD), got '{}'",
                    field, raw
                ))
            }),
    }
}

/// Parses an optional enum query parameter. Absent and blank both mean
/// "no filter"; unknown values are a validation error.
pub fn parse_enum<T: FromStr>(value: Option<&str>, field: &str) -> Result<Option<T>, ServiceError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            ServiceError::ValidationError(format!("{} has an unknown value: '{}'", field, raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::order::OrderStatus;

    #[test]
    fn blank_and_absent_parameters_mean_no_filter() {
        assert_eq!(parse_date(None, "date_start").unwrap(), None);
        assert_eq!(parse_date(Some("   "), "date_start").unwrap(), None);
        assert_eq!(
            parse_enum::<OrderStatus>(Some(""), "status").unwrap(),
            None
        );
    }

    #[test]
    fn valid_parameters_parse() {
        assert_eq!(
            parse_date(Some("2024-01-31"), "date_end").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(
            parse_enum::<OrderStatus>(Some("processing"), "status").unwrap(),
            Some(OrderStatus::Processing)
        );
    }

    #[test]
    fn malformed_parameters_are_validation_errors() {
        assert!(parse_date(Some("31/01/2024"), "date_start").is_err());
        assert!(parse_enum::<OrderStatus>(Some("shipped"), "status").is_err());
    }
}
