//! Date conversion at the UI/wire boundary.
//!
//! The UI works in `dd-mm-yyyy` (slashes also accepted, matching what the
//! date inputs historically produced); the wire uses `yyyy-mm-dd`.
//! Conversion happens at every boundary crossing, nowhere else.

use crate::snapshot::ValidationError;
use chrono::NaiveDate;

/// Parse a UI-side date (`dd-mm-yyyy` or `dd/mm/yyyy`, four-digit year).
pub fn parse_ui(input: &str) -> Result<NaiveDate, ValidationError> {
    let bad = || ValidationError::BadDate(input.to_string());

    let parts: Vec<&str> = input.split(['-', '/']).collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return Err(bad());
    }
    let day: u32 = parts[0].parse().map_err(|_| bad())?;
    let month: u32 = parts[1].parse().map_err(|_| bad())?;
    let year: i32 = parts[2].parse().map_err(|_| bad())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(bad)
}

/// Parse a wire-side date (`yyyy-mm-dd`).
pub fn parse_wire(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| ValidationError::BadDate(input.to_string()))
}

/// Wire form: `yyyy-mm-dd`.
pub fn format_wire(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// UI form: `dd-mm-yyyy`.
pub fn format_ui(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_accepts_dashes_and_slashes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_ui("07-03-2024").unwrap(), expected);
        assert_eq!(parse_ui("07/03/2024").unwrap(), expected);
    }

    #[test]
    fn ui_rejects_two_digit_years_and_garbage() {
        assert!(parse_ui("07-03-24").is_err());
        assert!(parse_ui("2024-03-07").is_err()); // wire format is not UI format
        assert!(parse_ui("notadate").is_err());
        assert!(parse_ui("31-02-2024").is_err());
    }

    #[test]
    fn boundary_round_trip() {
        let d = parse_ui("15-01-2024").unwrap();
        assert_eq!(format_wire(d), "2024-01-15");
        assert_eq!(parse_wire(&format_wire(d)).unwrap(), d);
        assert_eq!(format_ui(d), "15-01-2024");
    }
}
