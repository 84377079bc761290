//! Interactive front end.
//!
//! Reads questions, runs them through a [`Session`] stage by stage and
//! prints every artifact as soon as it exists, so a failing query still shows
//! the SQL that caused it.

pub mod format;

pub use format::{OutputFormat, format_result};

use crate::error::AskError;
use crate::models::Sanitized;
use crate::session::Session;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

const PROMPT: &str = "askdb> ";

pub struct Shell<'a> {
    session: &'a Session,
    format: OutputFormat,
}

impl<'a> Shell<'a> {
    pub fn new(session: &'a Session, format: OutputFormat) -> Self {
        Self { session, format }
    }

    /// Answer one question. Returns `false` if a stage failed; the error has
    /// already been written to `out` in that case.
    pub async fn answer<W>(&self, question: &str, out: &mut W) -> io::Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        let result = self.run_stages(question, out).await?;
        if let Err(e) = &result {
            debug!(error = ?e, "Question failed");
            out.write_all(format!("Error: {}\n", e).as_bytes()).await?;
            if let Some(suggestion) = e.suggestion() {
                out.write_all(format!("Hint: {}\n", suggestion).as_bytes())
                    .await?;
            }
        }
        out.flush().await?;
        Ok(result.is_ok())
    }

    /// Outer `Result` is output IO, inner is the pipeline.
    async fn run_stages<W>(
        &self,
        question: &str,
        out: &mut W,
    ) -> io::Result<Result<(), AskError>>
    where
        W: AsyncWrite + Unpin,
    {
        let generated = match self.session.generate_sql(question).await {
            Ok(sql) => sql,
            Err(e) => return Ok(Err(e)),
        };
        out.write_all(format!("Generated SQL:\n{}\n\n", generated).as_bytes())
            .await?;

        let Sanitized { sql, warnings } = match self.session.clean_sql(&generated) {
            Ok(sanitized) => sanitized,
            Err(e) => return Ok(Err(e)),
        };
        out.write_all(format!("Cleaned SQL:\n{}\n\n", sql).as_bytes())
            .await?;
        for warning in &warnings {
            out.write_all(format!("Warning: {}\n", warning).as_bytes())
                .await?;
        }

        let result = match self.session.execute(&sql).await {
            Ok(result) => result,
            Err(e) => return Ok(Err(e)),
        };
        let mut rendered = format_result(&result, self.format);
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        out.write_all(rendered.as_bytes()).await?;
        Ok(Ok(()))
    }

    /// Prompt for questions until `exit`, `quit` or end of input.
    ///
    /// Returns the number of questions that failed.
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> io::Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut failures = 0;

        loop {
            out.write_all(PROMPT.as_bytes()).await?;
            out.flush().await?;

            let Some(line) = lines.next_line().await? else {
                out.write_all(b"\n").await?;
                break;
            };

            let command = line.trim();
            if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
                break;
            }

            if !self.answer(&line, out).await? {
                failures += 1;
            }
            out.write_all(b"\n").await?;
        }

        out.flush().await?;
        info!(failures, "Shell finished");
        Ok(failures)
    }
}
