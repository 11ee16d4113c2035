//! Argument validators shared by selectors and argument handlers.
//!
//! Each check is a pure function returning the parsed value or the
//! [`QueryError`] describing why the token was rejected.

use chrono::NaiveDate;

use crate::error::QueryError;
use crate::record::{Column, DATE_FORMAT};
use crate::table::Table;

/// Delimiter joining column names for `-o` and words for `-w`.
pub const LIST_DELIMITER: char = '+';

/// Check that `count` tokens are available starting at `cursor`.
pub fn require_tokens(
    tokens: &[&str],
    cursor: usize,
    count: usize,
    usage: &str,
) -> Result<(), QueryError> {
    if cursor + count > tokens.len() {
        return Err(QueryError::MissingArgument(format!("please include {usage}")));
    }
    Ok(())
}

/// Parse a `M/D/YYYY` date. Month and day may be one or two digits.
pub fn parse_date(token: &str) -> Result<NaiveDate, QueryError> {
    let invalid = || QueryError::InvalidDateFormat(token.to_string());
    let parts: Vec<&str> = token.split('/').collect();
    let [month, day, year] = parts[..] else {
        return Err(invalid());
    };
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(month, 1, 2) || !digits(day, 1, 2) || !digits(year, 4, 4) {
        return Err(invalid());
    }
    let (Ok(y), Ok(m), Ok(d)) = (
        year.parse::<i32>(),
        month.parse::<u32>(),
        day.parse::<u32>(),
    ) else {
        return Err(invalid());
    };
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(invalid)
}

/// Parse a four-digit year.
pub fn parse_year(token: &str) -> Result<i32, QueryError> {
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QueryError::InvalidYear(token.to_string()));
    }
    token
        .parse()
        .map_err(|_| QueryError::InvalidYear(token.to_string()))
}

/// Parse a column name and check it is active in `table`.
pub fn parse_active_column(table: &Table<'_>, token: &str) -> Result<Column, QueryError> {
    let column: Column = token.parse()?;
    require_column(table, column)?;
    Ok(column)
}

pub fn require_column(table: &Table<'_>, column: Column) -> Result<(), QueryError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(QueryError::UnknownColumn(column.to_string()))
    }
}

/// Parse a `+`-joined list of active columns. Repeats are dropped.
pub fn parse_column_list(table: &Table<'_>, token: &str) -> Result<Vec<Column>, QueryError> {
    let mut columns = Vec::new();
    for name in token.split(LIST_DELIMITER) {
        if name.is_empty() {
            return Err(QueryError::UnknownColumn(token.to_string()));
        }
        let column = parse_active_column(table, name)?;
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    Ok(columns)
}

/// Check that `tokens[index]` is exactly `literal`.
pub fn expect_literal(tokens: &[&str], index: usize, literal: &str) -> Result<(), QueryError> {
    match tokens.get(index) {
        Some(&t) if t == literal => Ok(()),
        Some(&t) => Err(QueryError::BadOperator {
            expected: literal.to_string(),
            found: t.to_string(),
        }),
        None => Err(QueryError::MissingArgument(format!(
            "expected [{literal}]"
        ))),
    }
}

/// Check `start` is strictly before `end`.
pub fn require_ordered(start: NaiveDate, end: NaiveDate) -> Result<(), QueryError> {
    if start < end {
        Ok(())
    } else {
        Err(QueryError::UnorderedDateRange {
            start: start.format(DATE_FORMAT).to_string(),
            end: end.format(DATE_FORMAT).to_string(),
        })
    }
}

/// Position of the row for `date` in `table`.
pub fn require_date_in_view(table: &Table<'_>, date: NaiveDate) -> Result<usize, QueryError> {
    table
        .position_of(date)
        .ok_or_else(|| QueryError::DateOutOfRange(date.format(DATE_FORMAT).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::table::Archive;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_require_tokens() {
        let tokens = ["all", "-r", "1/1/2021"];
        assert!(require_tokens(&tokens, 2, 1, "a date").is_ok());
        assert!(matches!(
            require_tokens(&tokens, 2, 2, "two dates"),
            Err(QueryError::MissingArgument(_))
        ));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("1/5/2021"), Ok(day(2021, 1, 5)));
        assert_eq!(parse_date("01/05/2021"), Ok(day(2021, 1, 5)));
        assert_eq!(parse_date("12/31/2020"), Ok(day(2020, 12, 31)));
    }

    #[test]
    fn test_parse_date_rejects_bad_syntax() {
        for bad in ["2021-01-05", "1/5/21", "13/1/2021", "2/30/2021", "a/b/cdef", "1/5", ""] {
            assert_eq!(
                parse_date(bad),
                Err(QueryError::InvalidDateFormat(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2021"), Ok(2021));
        assert!(parse_year("21").is_err());
        assert!(parse_year("two").is_err());
    }

    #[test]
    fn test_parse_column_list() {
        let archive = Archive::new(vec![Record::new(day(2021, 1, 1))]);
        let table = archive.view();
        assert_eq!(
            parse_column_list(&table, "date+happiness+date"),
            Ok(vec![Column::Date, Column::Happiness])
        );
        assert_eq!(
            parse_column_list(&table, "date+mood"),
            Err(QueryError::UnknownColumn("mood".to_string()))
        );

        let narrowed = table.project(&[Column::Date]);
        assert_eq!(
            parse_column_list(&narrowed, "happiness"),
            Err(QueryError::UnknownColumn("happiness".to_string()))
        );
    }

    #[test]
    fn test_expect_literal() {
        let tokens = ["alice", ">", "people"];
        assert!(expect_literal(&tokens, 1, ">").is_ok());
        assert_eq!(
            expect_literal(&tokens, 2, ">"),
            Err(QueryError::BadOperator {
                expected: ">".to_string(),
                found: "people".to_string()
            })
        );
        assert!(matches!(
            expect_literal(&tokens, 3, ">"),
            Err(QueryError::MissingArgument(_))
        ));
    }

    #[test]
    fn test_require_ordered() {
        assert!(require_ordered(day(2021, 1, 1), day(2021, 1, 2)).is_ok());
        assert!(require_ordered(day(2021, 1, 2), day(2021, 1, 2)).is_err());
        assert!(require_ordered(day(2021, 1, 3), day(2021, 1, 2)).is_err());
    }

    #[test]
    fn test_require_date_in_view() {
        let archive = Archive::new(vec![
            Record::new(day(2021, 1, 1)),
            Record::new(day(2021, 1, 3)),
        ]);
        let table = archive.view();
        assert_eq!(require_date_in_view(&table, day(2021, 1, 3)), Ok(1));
        assert_eq!(
            require_date_in_view(&table, day(2021, 1, 2)),
            Err(QueryError::DateOutOfRange("01/02/2021".to_string()))
        );
    }
}
