//! Date parsing for spreadsheet cells.
//!
//! Dates reach the loader in three shapes: text (ISO or day-first), Excel serial
//! numbers, or native Polars `Date`/`Datetime` values. Every shape is reduced to
//! `Option<NaiveDate>`; `None` marks a row the loader drops.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use polars::prelude::{Column, DataType};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Spanish month names, January first.
pub(crate) const SPANISH_MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub(crate) fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Converts an Excel serial day number (1900 date system) to a date.
pub(crate) fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Excel counts from 1899-12-30 once its fictitious 1900-02-29 is accounted for
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Days since the Unix epoch, the physical representation of a Polars `Date`.
pub(crate) fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - NaiveDate::from_ymd_opt(1970, 1, 1).map_or(719_163, |d| d.num_days_from_ce())
}

pub(crate) fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + 719_163)
}

/// English month name, as produced for the derived month column.
pub(crate) fn month_name(date: NaiveDate) -> &'static str {
    chrono::Month::try_from(date.month() as u8)
        .map(|m| m.name())
        .unwrap_or("")
}

/// Month number (1-12) for a Spanish month name.
pub(crate) fn spanish_month_number(name: &str) -> Option<u32> {
    let name = name.trim();
    SPANISH_MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|idx| idx as u32 + 1)
}

/// Parses every value of a column into a date. Values that cannot be interpreted
/// become `None`; a column of an unsupported type yields all `None`.
pub(crate) fn parse_date_column(column: &Column) -> Vec<Option<NaiveDate>> {
    match column.dtype() {
        DataType::String => match column.str() {
            Ok(ca) => ca.into_iter().map(|v| v.and_then(parse_date_str)).collect(),
            Err(_) => vec![None; column.len()],
        },
        DataType::Date | DataType::Datetime(_, _) => column
            .cast(&DataType::Date)
            .and_then(|c| c.cast(&DataType::Int32))
            .ok()
            .and_then(|c| c.i32().ok().map(|ca| ca.into_iter().map(|v| v.and_then(from_epoch_days)).collect()))
            .unwrap_or_else(|| vec![None; column.len()]),
        dtype if dtype.is_primitive_numeric() => column
            .cast(&DataType::Float64)
            .ok()
            .and_then(|c| c.f64().ok().map(|ca| ca.into_iter().map(|v| v.and_then(from_excel_serial)).collect()))
            .unwrap_or_else(|| vec![None; column.len()]),
        _ => vec![None; column.len()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_text_dates() {
        assert_eq!(parse_date_str("1992-01-01"), Some(date(1992, 1, 1)));
        assert_eq!(parse_date_str("15/03/2001"), Some(date(2001, 3, 15)));
        assert_eq!(parse_date_str("2022-12-01 00:00:00"), Some(date(2022, 12, 1)));
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str(""), None);
    }

    #[test]
    fn test_excel_serial_dates() {
        assert_eq!(from_excel_serial(33604.0), Some(date(1992, 1, 1)));
        assert_eq!(from_excel_serial(44562.5), Some(date(2022, 1, 1)));
        assert_eq!(from_excel_serial(f64::NAN), None);
        assert_eq!(from_excel_serial(0.0), None);
    }

    #[test]
    fn test_epoch_days_round_trip() {
        let d = date(2005, 7, 14);
        assert_eq!(from_epoch_days(to_epoch_days(d)), Some(d));
        assert_eq!(to_epoch_days(date(1970, 1, 1)), 0);
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(date(1999, 2, 1)), "February");
        assert_eq!(spanish_month_number("septiembre"), Some(9));
        assert_eq!(spanish_month_number("Sept"), None);
    }

    #[test]
    fn test_parse_string_column_keeps_row_alignment() {
        let column = Column::new("Fecha".into(), &[Some("1992-01-01"), None, Some("garbage")]);
        let parsed = parse_date_column(&column);
        assert_eq!(parsed, vec![Some(date(1992, 1, 1)), None, None]);
    }

    #[test]
    fn test_parse_numeric_column_as_excel_serials() {
        let column = Column::new("Fecha".into(), &[33604.0f64, 33635.0]);
        let parsed = parse_date_column(&column);
        assert_eq!(parsed, vec![Some(date(1992, 1, 1)), Some(date(1992, 2, 1))]);
    }
}
