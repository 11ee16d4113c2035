//! Selector commands and the argument pipeline driver.
//!
//! A query runs in two phases. The selector picks the initial rows from the
//! archive and reports where its own arguments end. The driver then walks
//! the remaining tokens left to right, handing each operator and the current
//! frame to its handler until the tokens run out or a handler fails.

use rand::Rng;
use tracing::debug;

use crate::dsl::{Operator, Selector};
use crate::error::QueryError;
use crate::operator;
use crate::plot::PlotRenderer;
use crate::record::Column;
use crate::table::{Archive, Frame, Table};
use crate::validate::{parse_date, parse_year, require_tokens};

/// Build the initial view for `selector`.
///
/// Returns the cursor of the first token after the selector's own
/// arguments.
pub fn run_selector<'a, R>(
    selector: Selector,
    tokens: &[&str],
    archive: &'a Archive,
    rng: &mut R,
) -> Result<(usize, Table<'a>), QueryError>
where
    R: Rng,
{
    match selector {
        Selector::SingleDate => {
            require_tokens(tokens, 1, 1, "a date in the form M/D/YYYY")?;
            let date = parse_date(tokens[1])?;
            Ok((2, archive.view().filter(|r| r.date == date)))
        }
        Selector::RandomDate => {
            if let Some(extra) = tokens.get(1) {
                return Err(QueryError::ExcessArgument(extra.to_string()));
            }
            if archive.is_empty() {
                return Err(QueryError::EmptyArchive);
            }
            let pick = &archive.records()[rng.random_range(0..archive.len())];
            Ok((1, Table::new(vec![pick], Column::ALL.to_vec())))
        }
        Selector::Year => {
            require_tokens(tokens, 1, 1, "a year in the form YYYY")?;
            let year = parse_year(tokens[1])?;
            Ok((2, archive.view().filter(|r| r.year == year)))
        }
        Selector::All => Ok((1, archive.view())),
    }
}

/// Drive the argument operators starting at `cursor`.
///
/// Fails on the first error; a terminal result (a scalar or a shown plot)
/// must come from the last operator on the line.
pub fn run_arguments<'a>(
    tokens: &[&str],
    mut cursor: usize,
    mut frame: Frame<'a>,
    plotter: &mut dyn PlotRenderer,
) -> Result<Frame<'a>, QueryError> {
    while cursor < tokens.len() {
        let token = tokens[cursor];
        let op = Operator::from_token(token)
            .ok_or_else(|| QueryError::UnknownArgument(token.to_string()))?;
        debug!(operator = token, cursor, input = frame.shape(), "applying argument");

        let (next, result) = operator::apply(op, tokens, cursor + 1, frame, plotter)?;
        if result.is_terminal() && next < tokens.len() {
            return Err(QueryError::TrailingArgumentAfterScalar(op.token().to_string()));
        }
        cursor = next;
        frame = result;
    }
    Ok(frame)
}

/// Run a full query line: the selector, then any argument operators.
pub fn execute_query<'a, R>(
    selector: Selector,
    tokens: &[&str],
    archive: &'a Archive,
    rng: &mut R,
    plotter: &mut dyn PlotRenderer,
) -> Result<Frame<'a>, QueryError>
where
    R: Rng,
{
    let (cursor, table) = run_selector(selector, tokens, archive, rng)?;
    debug!(selector = selector.token(), rows = table.len(), "selected");
    run_arguments(tokens, cursor, Frame::Table(table), plotter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::PlotRequest;
    use crate::record::Record;
    use crate::table::Scalar;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Refuse;

    impl PlotRenderer for Refuse {
        fn render(&mut self, _request: &PlotRequest) -> Result<(), QueryError> {
            panic!("no plot expected");
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn archive() -> Archive {
        Archive::new(vec![
            Record::new(day(2020, 12, 31)).with_happiness(2.0),
            Record::new(day(2021, 1, 1)).with_happiness(4.0),
            Record::new(day(2021, 1, 2)).with_happiness(5.0),
        ])
    }

    fn query<'a>(archive: &'a Archive, line: &str) -> Result<Frame<'a>, QueryError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let selector = Selector::from_token(tokens[0]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        execute_query(selector, &tokens, archive, &mut rng, &mut Refuse)
    }

    fn row_count(frame: &Frame<'_>) -> usize {
        match frame {
            Frame::Table(t) => t.len(),
            other => panic!("expected table, got {}", other.shape()),
        }
    }

    #[test]
    fn test_single_date() {
        let archive = archive();
        let frame = query(&archive, "sd 1/1/2021").unwrap();
        assert_eq!(row_count(&frame), 1);
        let frame = query(&archive, "sd 1/3/2021").unwrap();
        assert_eq!(row_count(&frame), 0);
    }

    #[test]
    fn test_single_date_errors() {
        let archive = archive();
        assert!(matches!(query(&archive, "sd"), Err(QueryError::MissingArgument(_))));
        assert_eq!(
            query(&archive, "sd 2021-01-01"),
            Err(QueryError::InvalidDateFormat("2021-01-01".to_string()))
        );
    }

    #[test]
    fn test_random_date() {
        let archive = archive();
        let frame = query(&archive, "rd").unwrap();
        assert_eq!(row_count(&frame), 1);
        assert_eq!(
            query(&archive, "rd -o date"),
            Err(QueryError::ExcessArgument("-o".to_string()))
        );
        let empty = Archive::default();
        assert_eq!(query(&empty, "rd"), Err(QueryError::EmptyArchive));
    }

    #[test]
    fn test_year() {
        let archive = archive();
        assert_eq!(row_count(&query(&archive, "yr 2021").unwrap()), 2);
        assert_eq!(row_count(&query(&archive, "yr 1999").unwrap()), 0);
        assert_eq!(
            query(&archive, "yr abc"),
            Err(QueryError::InvalidYear("abc".to_string()))
        );
        assert!(matches!(query(&archive, "yr"), Err(QueryError::MissingArgument(_))));
    }

    #[test]
    fn test_arguments_chain_left_to_right() {
        let archive = archive();
        let frame = query(&archive, "all -r 12/31/2020 1/1/2021 -a happiness").unwrap();
        assert_eq!(frame, Frame::Scalar(Scalar::Number(3.0)));
        let frame = query(&archive, "yr 2021 -o happiness -s happiness").unwrap();
        assert_eq!(frame, Frame::Scalar(Scalar::Number(9.0)));
    }

    #[test]
    fn test_scalar_must_be_last() {
        let archive = archive();
        assert_eq!(
            query(&archive, "all -a happiness -o date"),
            Err(QueryError::TrailingArgumentAfterScalar("-a".to_string()))
        );
    }

    #[test]
    fn test_grouped_may_be_followed_by_plot_only() {
        let archive = archive();
        assert_eq!(
            query(&archive, "all -a happiness * year -o year"),
            Err(QueryError::NotATable("-o".to_string()))
        );
    }

    #[test]
    fn test_unknown_argument() {
        let archive = archive();
        assert_eq!(
            query(&archive, "all -c happiness"),
            Err(QueryError::UnknownArgument("-c".to_string()))
        );
        assert_eq!(
            query(&archive, "all -o date stray"),
            Err(QueryError::UnknownArgument("stray".to_string()))
        );
    }

    #[test]
    fn test_rows_never_reordered() {
        let archive = archive();
        let frame = query(&archive, "all -w 202 > date").unwrap();
        match frame {
            Frame::Table(t) => {
                let dates: Vec<_> = t.rows().iter().map(|r| r.date).collect();
                assert_eq!(dates, vec![day(2020, 12, 31), day(2021, 1, 1), day(2021, 1, 2)]);
            }
            other => panic!("expected table, got {}", other.shape()),
        }
    }
}
