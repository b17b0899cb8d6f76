//! Helpers for binding HTML form fields.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, de};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// Deserialize an optional form field where an empty string means "not set".
///
/// Browsers send `<select>` elements with an empty placeholder option and
/// blank text inputs as `name=`, which would otherwise fail to parse as a number.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;

    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => T::from_str(value).map(Some).map_err(de::Error::custom),
    }
}

const ISO_DATE: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Deserialize an optional YYYY-MM-DD field, e.g. from a date query parameter,
/// where an empty string means "not set".
pub fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;

    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Date::parse(value, ISO_DATE)
            .map(Some)
            .map_err(de::Error::custom),
    }
}

/// Interpret a checkbox field, which is only sent by the browser when checked.
pub fn is_checked(value: &Option<String>) -> bool {
    value.is_some()
}

#[cfg(test)]
mod empty_string_as_none_tests {
    use serde::Deserialize;

    use crate::form::empty_string_as_none;

    #[derive(Debug, Deserialize)]
    struct TestForm {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        parent_id: Option<i64>,
    }

    #[test]
    fn blank_is_none() {
        let form: TestForm = serde_html_form::from_str("parent_id=").unwrap();

        assert_eq!(form.parent_id, None);
    }

    #[test]
    fn missing_is_none() {
        let form: TestForm = serde_html_form::from_str("").unwrap();

        assert_eq!(form.parent_id, None);
    }

    #[test]
    fn number_is_parsed() {
        let form: TestForm = serde_html_form::from_str("parent_id=42").unwrap();

        assert_eq!(form.parent_id, Some(42));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(serde_html_form::from_str::<TestForm>("parent_id=abc").is_err());
    }
}

#[cfg(test)]
mod empty_date_as_none_tests {
    use serde::Deserialize;
    use time::{Date, macros::date};

    use crate::form::empty_date_as_none;

    #[derive(Debug, Deserialize)]
    struct TestQuery {
        #[serde(default, deserialize_with = "empty_date_as_none")]
        as_of: Option<Date>,
    }

    #[test]
    fn blank_is_none() {
        let query: TestQuery = serde_html_form::from_str("as_of=").unwrap();

        assert_eq!(query.as_of, None);
    }

    #[test]
    fn iso_date_is_parsed() {
        let query: TestQuery = serde_html_form::from_str("as_of=2025-06-30").unwrap();

        assert_eq!(query.as_of, Some(date!(2025 - 06 - 30)));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(serde_html_form::from_str::<TestQuery>("as_of=30/06/2025").is_err());
    }
}
