//! Column letters and bounds checks shared by all reference shapes

use crate::error::{Error, Result};
use crate::{MAX_COLUMNS, MAX_ROWS};

/// Convert a 1-based column index to letters (1 = A, 26 = Z, 27 = AA, etc.)
pub fn column_to_letters(column: u32) -> String {
    let mut result = Vec::new();
    let mut n = column;

    while n > 0 {
        n -= 1;
        result.push((n % 26) as u8 + b'A');
        n /= 26;
    }

    result.reverse();
    String::from_utf8(result).unwrap_or_default()
}

/// Convert column letters to a 1-based index (A = 1, Z = 26, AA = 27, etc.)
pub fn letters_to_column(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidAddress("empty column letters".into()));
    }

    let mut column: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        column = column * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if column > MAX_COLUMNS as u64 {
            return Err(Error::ColumnOutOfBounds(
                column.min(i64::MAX as u64) as i64,
                MAX_COLUMNS,
            ));
        }
    }

    Ok(column as u32)
}

/// Parse a 1-based row number
pub(crate) fn parse_row(digits: &str) -> Result<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAddress(format!("invalid row number '{}'", digits)));
    }
    let row: u64 = digits
        .parse()
        .map_err(|_| Error::RowOutOfBounds(i64::MAX, MAX_ROWS))?;
    check_row(row.min(i64::MAX as u64) as i64)
}

pub(crate) fn check_row(row: i64) -> Result<u32> {
    if (1..=MAX_ROWS as i64).contains(&row) {
        Ok(row as u32)
    } else {
        Err(Error::RowOutOfBounds(row, MAX_ROWS))
    }
}

/// Move a row index by `delta`; saturates so huge deltas report out of bounds
pub(crate) fn shift_row(row: u32, delta: i64) -> Result<u32> {
    check_row(i64::from(row).saturating_add(delta))
}

/// Move a column index by `delta`; saturates so huge deltas report out of bounds
pub(crate) fn shift_column(column: u32, delta: i64) -> Result<u32> {
    check_column(i64::from(column).saturating_add(delta))
}

pub(crate) fn check_column(column: i64) -> Result<u32> {
    if (1..=MAX_COLUMNS as i64).contains(&column) {
        Ok(column as u32)
    } else {
        Err(Error::ColumnOutOfBounds(column, MAX_COLUMNS))
    }
}

/// Split `$AB$12` style text into (absolute, letters) and the remainder
pub(crate) fn split_column(text: &str) -> (bool, &str, &str) {
    let (absolute, rest) = match text.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    (absolute, &rest[..end], &rest[end..])
}

/// Split `$12` style text into (absolute, digits)
pub(crate) fn split_row(text: &str) -> (bool, &str) {
    match text.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(column_to_letters(1), "A");
        assert_eq!(column_to_letters(2), "B");
        assert_eq!(column_to_letters(26), "Z");
        assert_eq!(column_to_letters(27), "AA");
        assert_eq!(column_to_letters(28), "AB");
        assert_eq!(column_to_letters(702), "ZZ");
        assert_eq!(column_to_letters(703), "AAA");
        assert_eq!(column_to_letters(16384), "XFD"); // Max Excel column
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(letters_to_column("A").unwrap(), 1);
        assert_eq!(letters_to_column("Z").unwrap(), 26);
        assert_eq!(letters_to_column("AA").unwrap(), 27);
        assert_eq!(letters_to_column("ZZ").unwrap(), 702);
        assert_eq!(letters_to_column("XFD").unwrap(), 16384);

        // Case insensitive
        assert_eq!(letters_to_column("a").unwrap(), 1);
        assert_eq!(letters_to_column("aa").unwrap(), 27);

        assert!(letters_to_column("XFE").is_err());
        assert!(letters_to_column("A1").is_err());
        assert!(letters_to_column("").is_err());
    }

    #[test]
    fn test_parse_row() {
        assert_eq!(parse_row("1").unwrap(), 1);
        assert_eq!(parse_row("1048576").unwrap(), 1_048_576);
        assert!(parse_row("0").is_err());
        assert!(parse_row("1048577").is_err());
        assert!(parse_row("99999999999999999999999").is_err());
        assert!(parse_row("-1").is_err());
    }

    #[test]
    fn test_split_helpers() {
        assert_eq!(split_column("$AB$12"), (true, "AB", "$12"));
        assert_eq!(split_column("c7"), (false, "c", "7"));
        assert_eq!(split_row("$12"), (true, "12"));
    }
}
