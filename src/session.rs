//! The interactive shell: session log, dispatch and the read loop.

use std::io::{self, BufRead, Write};

use rand::rngs::StdRng;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::config::ShellConfig;
use crate::dsl::{Builtin, Command, HELP_TEXT, parse_command, tokenize};
use crate::error::QueryError;
use crate::executor::execute_query;
use crate::plot::PlotRenderer;
use crate::render::{RenderConfig, render_frame};
use crate::table::Archive;

/// Prompt printed before each line is read.
pub const PROMPT: &str = ": ";

/// Outcome of one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A result was printed.
    Success,
    /// An error message was printed; the session continues.
    Error,
    /// The user asked to leave.
    Exit,
}

impl Status {
    pub fn code(&self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Error => 1,
            Status::Exit => -1,
        }
    }
}

/// Raw input lines entered this session, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLog {
    lines: Vec<String>,
}

impl SessionLog {
    pub fn push(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            "Log is empty".to_string()
        } else {
            self.lines.join("\n")
        }
    }
}

/// One shell session over a loaded archive.
pub struct Session<P> {
    archive: Archive,
    log: SessionLog,
    rng: StdRng,
    render: RenderConfig,
    plotter: P,
}

impl<P: PlotRenderer> Session<P> {
    pub fn new(archive: Archive, config: &ShellConfig, plotter: P) -> Self {
        Self {
            archive,
            log: SessionLog::default(),
            rng: config.rng(),
            render: config.render,
            plotter,
        }
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn plotter(&self) -> &P {
        &self.plotter
    }

    /// Run one input line, writing its result or error message to `out`.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Status> {
        let tokens = tokenize(line);
        let command = parse_command(&tokens);
        if command.as_ref().map_or(true, Command::is_logged) {
            self.log.push(line);
        }

        let selector = match command {
            Ok(Command::Builtin(Builtin::Exit)) => return Ok(Status::Exit),
            Ok(Command::Builtin(Builtin::Help)) => {
                writeln!(out, "{HELP_TEXT}")?;
                return Ok(Status::Success);
            }
            Ok(Command::Builtin(Builtin::Log)) => {
                writeln!(out, "{}", self.log.render())?;
                return Ok(Status::Success);
            }
            Ok(Command::Select(selector)) => selector,
            Err(e) => return report(line, &e, out),
        };

        match execute_query(
            selector,
            &tokens,
            &self.archive,
            &mut self.rng,
            &mut self.plotter,
        ) {
            Ok(frame) => {
                debug!(line, result = frame.shape(), "command complete");
                if let Some(text) = render_frame(&frame, &self.render) {
                    writeln!(out, "{text}")?;
                }
                Ok(Status::Success)
            }
            Err(e) => report(line, &e, out),
        }
    }

    /// Prompt for and run lines from `input` until `exit` or end of input.
    ///
    /// Bytes that are not UTF-8 are replaced rather than ending the session.
    /// `input` must not hold a lock the plotter needs to read its dismissal,
    /// so pass an unlocked handle rather than `io::stdin().lock()`.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> io::Result<()> {
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            let mut raw = Vec::new();
            if input.read_until(b'\n', &mut raw)? == 0 {
                writeln!(out)?;
                return Ok(());
            }
            let line = String::from_utf8_lossy(&raw);
            if self.execute(line.trim_end_matches(['\r', '\n']), out)? == Status::Exit {
                return Ok(());
            }
        }
    }

    /// The interactive prompt, with line editing and history.
    ///
    /// Ctrl-C abandons the current line; Ctrl-D leaves like `exit`.
    pub fn run_editor<W: Write>(
        &mut self,
        editor: &mut DefaultEditor,
        out: &mut W,
    ) -> Result<(), ReadlineError> {
        loop {
            let line = match editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(()),
                Err(e) => return Err(e),
            };
            if !line.trim().is_empty() {
                editor.add_history_entry(line.as_str())?;
            }
            let status = self.execute(&line, out)?;
            out.flush()?;
            if status == Status::Exit {
                return Ok(());
            }
        }
    }

    /// Run a fixed list of lines, echoing each after the prompt.
    ///
    /// Stops at `exit`, and at the first error unless `continue_on_error`.
    /// Returns the status of the last line run.
    pub fn run_script<W: Write>(
        &mut self,
        lines: &[String],
        continue_on_error: bool,
        out: &mut W,
    ) -> io::Result<Status> {
        let mut status = Status::Success;
        for line in lines {
            writeln!(out, "{PROMPT}{line}")?;
            status = self.execute(line, out)?;
            match status {
                Status::Exit => break,
                Status::Error if !continue_on_error => break,
                _ => {}
            }
        }
        Ok(status)
    }
}

fn report<W: Write>(line: &str, error: &QueryError, out: &mut W) -> io::Result<Status> {
    warn!(line, %error, "command rejected");
    writeln!(out, "{error}")?;
    Ok(Status::Error)
}
