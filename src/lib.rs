//! # diary-shell
//!
//! An interactive query shell over a personal diary archive.
//!
//! The archive is a CSV snapshot with one entry per day: a date, a free-text
//! summary, a happiness rating, the length of an audio recording, and the
//! people involved. Each shell line picks rows with a selector and then
//! narrows, projects, searches, aggregates, or plots them with a chain of
//! argument operators.
//!
//! ## Overview
//!
//! - **Selectors**: `sd`, `rd`, `yr`, `all` build the initial view
//! - **Arguments**: `-r`, `-o`, `-w`, `-a`, `-s`, `-p` transform it left to right
//! - **Builtins**: `help`, `log`, `exit`
//!
//! ## Example
//!
//! ```
//! use diary_shell::{ShellConfig, Session, Status, read_archive};
//! use diary_shell::plot::{PlotRenderer, PlotRequest};
//! use diary_shell::QueryError;
//!
//! struct NoPlots;
//!
//! impl PlotRenderer for NoPlots {
//!     fn render(&mut self, _request: &PlotRequest) -> Result<(), QueryError> {
//!         Ok(())
//!     }
//! }
//!
//! let csv = "date,summary,happiness,recording,people\n\
//!            01/01/2021,Skating,5.0,0:12:40,Alice\n\
//!            01/02/2021,Reading,4.0,,\n";
//! let archive = read_archive(csv.as_bytes()).unwrap();
//! let mut session = Session::new(archive, &ShellConfig::default(), NoPlots);
//!
//! let mut out = Vec::new();
//! let status = session.execute("all -a happiness", &mut out).unwrap();
//!
//! assert_eq!(status, Status::Success);
//! assert_eq!(String::from_utf8(out).unwrap(), "4.5\n");
//! ```

pub mod config;
pub mod dsl;
pub mod error;
pub mod executor;
pub mod operator;
pub mod plot;
pub mod record;
pub mod render;
pub mod session;
pub mod store;
pub mod table;
pub mod validate;

pub use config::ShellConfig;
pub use dsl::{Builtin, Command, HELP_TEXT, Operator, Selector, parse_command, tokenize};
pub use error::{LoadError, QueryError};
pub use executor::{execute_query, run_arguments, run_selector};
pub use plot::{PlotKind, PlotRenderer, PlotRequest, TerminalPlotter};
pub use record::{Column, Record, Value};
pub use render::{RenderConfig, render_frame};
pub use session::{Session, SessionLog, Status};
pub use store::{load_archive, read_archive};
pub use table::{Aggregate, Archive, Frame, GroupedTable, Scalar, Table};
