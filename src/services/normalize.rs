//! Date and amount normalization for locale-ambiguous CSV values

use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

/// Parse a locale-ambiguous date string
///
/// Patterns are tried in order: `DD/MM/YYYY` (also `-` or `.` separators,
/// 2- or 4-digit year, 2-digit years read as 20xx), then `YYYY-MM-DD`, then
/// `MM/DD/YYYY`. The first pattern whose regex matches and whose constructed
/// date is valid wins.
///
/// Because the day-first branch is checked first and shares its shape with
/// the month-first branch, `03/04/2024` is always read as April 3rd; the
/// month-first branch is only reached when the first number cannot be a
/// month-day pair (e.g. `04/25/2024`). Callers must supply their own
/// fallback (typically today) for a `None` result.
pub fn parse_flexible_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let dmy = Regex::new(r"^(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4}|\d{2})$").unwrap();
    if let Some(caps) = dmy.captures(input) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = expand_year(&caps[3])?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    let iso = Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap();
    if let Some(caps) = iso.captures(input) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    let mdy = Regex::new(r"^(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4}|\d{2})$").unwrap();
    if let Some(caps) = mdy.captures(input) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year = expand_year(&caps[3])?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    None
}

/// 2-digit years are assumed to be 20xx
fn expand_year(raw: &str) -> Option<i32> {
    let value: i32 = raw.parse().ok()?;
    if raw.len() == 2 {
        Some(2000 + value)
    } else {
        Some(value)
    }
}

/// Parse a currency-formatted amount string
///
/// Strips every character that is not a digit, comma or period, replaces
/// comma with period, then parses. Failure yields `0` rather than an error:
/// the import pipeline is deliberately lenient, and rows whose amount stays
/// at zero are dropped later by the importability check rather than aborting
/// the whole file.
pub fn parse_flexible_amount(input: &str) -> Decimal {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let normalized = cleaned.replace(',', ".");
    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_first_date() {
        assert_eq!(parse_flexible_date("15/03/2024"), Some(date(2024, 3, 15)));
        assert_eq!(parse_flexible_date("15-03-2024"), Some(date(2024, 3, 15)));
        assert_eq!(parse_flexible_date("15.03.2024"), Some(date(2024, 3, 15)));
        assert_eq!(parse_flexible_date("5/3/2024"), Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_two_digit_year_is_20xx() {
        assert_eq!(parse_flexible_date("15/03/24"), Some(date(2024, 3, 15)));
        assert_eq!(parse_flexible_date("01/01/99"), Some(date(2099, 1, 1)));
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(parse_flexible_date("2024-03-15"), Some(date(2024, 3, 15)));
    }

    #[test]
    fn test_ambiguous_date_is_always_day_first() {
        // Documented quirk: 03/04/2024 could be March 4th in a US file, but
        // the day-first branch is checked first and wins.
        assert_eq!(parse_flexible_date("03/04/2024"), Some(date(2024, 4, 3)));
    }

    #[test]
    fn test_month_first_reached_when_day_first_invalid() {
        // 25 cannot be a month, so the day-first construction fails and the
        // month-first branch picks it up.
        assert_eq!(parse_flexible_date("04/25/2024"), Some(date(2024, 4, 25)));
    }

    #[test]
    fn test_unparsable_dates() {
        assert_eq!(parse_flexible_date("not-a-date"), None);
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("32/13/2024"), None);
        assert_eq!(parse_flexible_date("2024/03/15"), None);
    }

    #[test]
    fn test_amount_with_currency_and_grouping() {
        assert_eq!(
            parse_flexible_amount("1 234,56 €"),
            Decimal::new(123456, 2)
        );
        assert_eq!(parse_flexible_amount("$99.95"), Decimal::new(9995, 2));
        assert_eq!(parse_flexible_amount("1200"), Decimal::new(1200, 0));
    }

    #[test]
    fn test_minus_sign_is_stripped() {
        // Everything outside digits/comma/period is stripped, signs
        // included; credit notes come out positive.
        assert_eq!(parse_flexible_amount("-50,00"), Decimal::new(5000, 2));
    }

    #[test]
    fn test_unparsable_amount_is_zero_not_error() {
        // Lenient-import policy: bad amounts become 0, the row is then
        // dropped by the importability check instead of failing the file.
        assert_eq!(parse_flexible_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_flexible_amount(""), Decimal::ZERO);
        assert_eq!(parse_flexible_amount("N/A"), Decimal::ZERO);
    }
}
