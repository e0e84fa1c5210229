// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Textual identifiers on a receipt and their numeric wire values.
//!
//! | field | text form | wire value |
//! |---|---|---|
//! | report number | `Z0001` | `1` |
//! | transaction id | `TX202501150042` | `42` (date comes from the timestamp) |
//! | registration id | `0123456789` | `123456789` |
//! | serial | `F0042` | `42` |

use chrono::{DateTime, NaiveDate, Utc};

use crate::{EncodeError, Field};

const REPORT_PREFIX: &str = "Z";
const TRANSACTION_PREFIX: &str = "TX";
const SERIAL_PREFIX: &str = "F";
const DATE_FORMAT: &str = "%Y%m%d";
const DATE_LEN: usize = 8;

pub fn format_report_number(sequence: u32) -> String {
    format!("{REPORT_PREFIX}{sequence:04}")
}

pub fn format_transaction_id(timestamp: &DateTime<Utc>, sequence: u32) -> String {
    format!(
        "{TRANSACTION_PREFIX}{}{sequence:04}",
        timestamp.format(DATE_FORMAT)
    )
}

pub fn format_registration_id(id: u32) -> String {
    format!("{id:010}")
}

pub fn format_serial(sequence: u32) -> String {
    format!("{SERIAL_PREFIX}{sequence:04}")
}

pub fn parse_report_number(value: &str) -> Result<u32, EncodeError> {
    value
        .strip_prefix(REPORT_PREFIX)
        .and_then(parse_digits)
        .ok_or_else(|| invalid(Field::ReportNumber, value))
}

/// Returns the sequence part of a transaction id, after checking that its
/// date part is the UTC date of `timestamp`.
pub fn parse_transaction_id(value: &str, timestamp: &DateTime<Utc>) -> Result<u32, EncodeError> {
    let rest = value
        .strip_prefix(TRANSACTION_PREFIX)
        .ok_or_else(|| invalid(Field::TransactionId, value))?;
    let (date, sequence) = rest
        .split_at_checked(DATE_LEN)
        .ok_or_else(|| invalid(Field::TransactionId, value))?;
    if !date.bytes().all(|b| b.is_ascii_digit())
        || NaiveDate::parse_from_str(date, DATE_FORMAT).is_err()
    {
        return Err(invalid(Field::TransactionId, value));
    }
    let sequence = parse_digits(sequence).ok_or_else(|| invalid(Field::TransactionId, value))?;

    let expected = timestamp.format(DATE_FORMAT).to_string();
    if date != expected {
        return Err(EncodeError::TransactionDateMismatch {
            transaction_id: value.to_string(),
            expected,
        });
    }
    Ok(sequence)
}

pub fn parse_registration_id(value: &str) -> Result<u32, EncodeError> {
    parse_digits(value).ok_or_else(|| invalid(Field::RegistrationId, value))
}

pub fn parse_serial(value: &str) -> Result<u32, EncodeError> {
    value
        .strip_prefix(SERIAL_PREFIX)
        .and_then(parse_digits)
        .ok_or_else(|| invalid(Field::Serial, value))
}

/// A non-empty run of ASCII digits that fits in 32 bits.
fn parse_digits(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn invalid(field: Field, value: &str) -> EncodeError {
    EncodeError::InvalidPattern {
        field,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::*;

    use super::*;

    #[fixture]
    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn formats_are_zero_padded() {
        assert_eq!(format_report_number(1), "Z0001");
        assert_eq!(format_serial(42), "F0042");
        assert_eq!(format_serial(123_456), "F123456");
        assert_eq!(format_registration_id(123_456_789), "0123456789");
    }

    #[rstest]
    fn transaction_id_carries_the_date(timestamp: DateTime<Utc>) {
        let id = format_transaction_id(&timestamp, 42);
        assert_eq!(id, "TX202501150042");
        assert_eq!(parse_transaction_id(&id, &timestamp), Ok(42));
    }

    #[rstest]
    #[case::missing_prefix("202501150042")]
    #[case::short_date("TX2025011")]
    #[case::no_sequence("TX20250115")]
    #[case::bad_date("TX202513450001")]
    #[case::signed_sequence("TX20250115+001")]
    #[case::sequence_overflow("TX2025011599999999999")]
    fn malformed_transaction_ids(timestamp: DateTime<Utc>, #[case] value: &str) {
        assert!(matches!(
            parse_transaction_id(value, &timestamp),
            Err(EncodeError::InvalidPattern {
                field: Field::TransactionId,
                ..
            })
        ));
    }

    #[rstest]
    fn transaction_id_from_another_day(timestamp: DateTime<Utc>) {
        assert!(matches!(
            parse_transaction_id("TX202501140001", &timestamp),
            Err(EncodeError::TransactionDateMismatch { .. })
        ));
    }

    #[rstest]
    #[case("Z0001", Ok(1))]
    #[case("Z4294967295", Ok(u32::MAX))]
    #[case("Z4294967296", Err(()))]
    #[case("Z", Err(()))]
    #[case("z0001", Err(()))]
    #[case("Z-1", Err(()))]
    fn report_numbers(#[case] value: &str, #[case] expected: Result<u32, ()>) {
        assert_eq!(parse_report_number(value).map_err(|_| ()), expected);
    }

    #[rstest]
    #[case("F0001", Ok(1))]
    #[case("F", Err(()))]
    #[case("0001", Err(()))]
    fn serials(#[case] value: &str, #[case] expected: Result<u32, ()>) {
        assert_eq!(parse_serial(value).map_err(|_| ()), expected);
    }

    #[rstest]
    #[case("0123456789", Ok(123_456_789))]
    #[case("4294967295", Ok(u32::MAX))]
    #[case("9999999999", Err(()))]
    #[case("12ab", Err(()))]
    #[case("", Err(()))]
    fn registration_ids(#[case] value: &str, #[case] expected: Result<u32, ()>) {
        assert_eq!(parse_registration_id(value).map_err(|_| ()), expected);
    }
}
