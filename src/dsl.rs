//! Tokenizer and command grammar for the diary shell.
//!
//! Query format:
//! ```text
//! sd 1/5/2021 -o date+summary
//! all -r 12/1/2020 12/31/2020 -a happiness * weekday
//! yr 2021 -w alice > people -o date+happiness -p line
//! ```
//!
//! - The first token is a selector (`sd`, `rd`, `yr`, `all`) or a built-in
//!   (`help`, `log`, `exit`)
//! - Every following token group is an argument operator, applied left to
//!   right to the result of the previous one
//!
//! Selectors:
//! - `sd M/D/YYYY` - The entry for one date
//! - `rd` - One entry chosen at random (takes no arguments)
//! - `yr YYYY` - Every entry in a year
//! - `all` - Every entry
//!
//! Argument operators:
//! - `-r d1 d2` - Reduce to the rows from d1 through d2 (both must exist)
//! - `-o c1+c2+...` - Output only the named columns, in that order
//! - `-w term > col` - Keep rows whose column contains the term (`+` joins words);
//!   further clauses may follow, joined by `&` (both) or `|` (either)
//! - `-a happiness [* col]` - Average, optionally grouped by another column
//! - `-s happiness [* col]` - Sum, optionally grouped by another column
//! - `-s recording` - Total recording time
//! - `-p bar|line` - Plot a two-column result

use crate::error::QueryError;

/// Grammar reference printed by `help`.
pub const HELP_TEXT: &str = "\
Selectors:
  sd  [M/D/YYYY]                 entry for one date
  rd                             random entry
  yr  [YYYY]                     all entries in a year
  all                            all entries

Arguments (applied left to right after a selector):
  -r  d1 d2                      rows from d1 through d2 (d1 before d2, both present)
  -o  c1+c2+...                  only these columns, in this order
  -w  term > col [& term > col]  rows where col contains term (+ joins words; & and, | or)
  -a  happiness [* col]          average happiness, optionally per value of col
  -s  happiness [* col]          total happiness, optionally per value of col
  -s  recording                  total recording time
  -p  bar|line                   plot a two-column result

Notes:
  -a and -s without * must be the last argument.
  -p needs exactly two columns; use -o first.
  Columns: date year month weekday summary happiness recording people

Built-ins:
  help                           this text
  log                            commands entered this session
  exit                           leave the shell";

/// Split an input line into whitespace-delimited tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// A command that picks the initial slice of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// sd M/D/YYYY
    SingleDate,
    /// rd
    RandomDate,
    /// yr YYYY
    Year,
    /// all
    All,
}

impl Selector {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "sd" => Some(Selector::SingleDate),
            "rd" => Some(Selector::RandomDate),
            "yr" => Some(Selector::Year),
            "all" => Some(Selector::All),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Selector::SingleDate => "sd",
            Selector::RandomDate => "rd",
            Selector::Year => "yr",
            Selector::All => "all",
        }
    }
}

/// An argument operator that transforms the current result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// -r d1 d2
    Reduce,
    /// -o c1+c2
    Output,
    /// -w term > col
    With,
    /// -a col [* col2]
    Average,
    /// -s col [* col2]
    Sum,
    /// -p kind
    Plot,
}

impl Operator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "-r" => Some(Operator::Reduce),
            "-o" => Some(Operator::Output),
            "-w" => Some(Operator::With),
            "-a" => Some(Operator::Average),
            "-s" => Some(Operator::Sum),
            "-p" => Some(Operator::Plot),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Operator::Reduce => "-r",
            Operator::Output => "-o",
            Operator::With => "-w",
            Operator::Average => "-a",
            Operator::Sum => "-s",
            Operator::Plot => "-p",
        }
    }
}

/// Shell commands that do not query the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Help,
    Log,
    Exit,
}

/// What the first token of a line resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Builtin(Builtin),
    Select(Selector),
}

impl Command {
    /// Whether the line should be recorded in the session log.
    pub fn is_logged(&self) -> bool {
        !matches!(self, Command::Builtin(Builtin::Help | Builtin::Log))
    }
}

/// Resolve the first token of a tokenized line.
pub fn parse_command(tokens: &[&str]) -> Result<Command, QueryError> {
    let first = *tokens.first().ok_or(QueryError::NoCommand)?;
    match first {
        "exit" => Ok(Command::Builtin(Builtin::Exit)),
        "help" => Ok(Command::Builtin(Builtin::Help)),
        "log" => Ok(Command::Builtin(Builtin::Log)),
        _ => Selector::from_token(first)
            .map(Command::Select)
            .ok_or_else(|| QueryError::UnknownCommand(first.to_string())),
    }
}
