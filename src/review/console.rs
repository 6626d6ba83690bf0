//! Operator console: stdin/stdout REPL over the review board.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::dispatch::DispatchGateway;
use crate::export;
use crate::review::board::ReviewBoard;
use crate::review::model::{ReviewEntry, ReviewStatus};

const HELP: &str = "\
Commands:
  list [pending|sent|rejected]  List entries (all by default)
  show <n>                      Show entry n with its draft
  edit <n>                      Replace the draft of entry n (end with a lone '.')
  approve <n>                   Send the draft of entry n
  reject <n>                    Reject / mark entry n reviewed
  summary                       Counts over all entries
  export <dir>                  Write triage.csv and draft records to <dir>
  help                          This text
  quit                          Leave the console";

/// A parsed console command. Entry numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCommand {
    List(Option<ReviewStatus>),
    Show(usize),
    Edit(usize),
    Approve(usize),
    Reject(usize),
    Summary,
    Export(PathBuf),
    Help,
    Quit,
}

impl ReviewCommand {
    /// Parse one input line. Returns a usage message on bad input.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Err("empty command".into());
        };
        let arg = parts.next();

        let index = |name: &str| -> Result<usize, String> {
            arg.and_then(|a| a.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("usage: {name} <n>"))
        };

        match command.to_ascii_lowercase().as_str() {
            "list" | "ls" => match arg.map(str::to_ascii_lowercase).as_deref() {
                None | Some("all") => Ok(Self::List(None)),
                Some("pending") => Ok(Self::List(Some(ReviewStatus::Pending))),
                Some("sent") => Ok(Self::List(Some(ReviewStatus::ApprovedSent))),
                Some("rejected") => Ok(Self::List(Some(ReviewStatus::Rejected))),
                Some(other) => Err(format!("unknown filter '{other}'")),
            },
            "show" => index("show").map(Self::Show),
            "edit" => index("edit").map(Self::Edit),
            "approve" | "send" => index("approve").map(Self::Approve),
            "reject" | "skip" => index("reject").map(Self::Reject),
            "summary" => Ok(Self::Summary),
            "export" => arg
                .map(|dir| Self::Export(PathBuf::from(dir)))
                .ok_or_else(|| "usage: export <dir>".to_string()),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}', try 'help'")),
        }
    }
}

/// One line per entry for `list`.
fn list_line(n: usize, entry: &ReviewEntry) -> String {
    let category = entry.category().map(|c| c.label()).unwrap_or("unclassified");
    let mut flags = String::new();
    if entry.needs_review {
        flags.push_str(" [review]");
    }
    if entry.has_draft() {
        flags.push_str(" [draft]");
    }
    if let Some(failure) = &entry.failure {
        flags.push_str(&format!(" [{} failed]", failure.label()));
    }
    if entry.dispatch_error.is_some() {
        flags.push_str(" [send failed]");
    }
    format!(
        "{n:>3}. {:<8} {:<16} {} | {}{flags}",
        entry.status.label(),
        category,
        entry.message.sender(),
        entry.message.subject(),
    )
}

/// Full view of one entry for `show`.
fn detail(n: usize, entry: &ReviewEntry) -> String {
    let mut out = format!("#{n} [{}]\n", entry.status);
    out.push_str(&format!("From:    {}\n", entry.message.sender()));
    out.push_str(&format!("Subject: {}\n", entry.message.subject()));
    match &entry.classification {
        Some(c) => {
            out.push_str(&format!(
                "Triage:  {} | {} priority | {} sentiment | reply: {}\n",
                c.category,
                c.priority,
                c.sentiment,
                if c.needs_reply { "yes" } else { "no" }
            ));
            if let Some(reason) = &c.reason {
                out.push_str(&format!("Reason:  {reason}\n"));
            }
        }
        None => out.push_str("Triage:  unclassified\n"),
    }
    if let Some(tone) = entry.tone {
        out.push_str(&format!("Tone:    {tone}\n"));
    }
    if entry.needs_review {
        out.push_str("Flagged: needs human review\n");
    }
    if let Some(failure) = &entry.failure {
        out.push_str(&format!("Failure: {failure}\n"));
    }
    if let Some(err) = &entry.dispatch_error {
        out.push_str(&format!("Send error: {err}\n"));
    }
    out.push_str(&format!("\n{}\n", entry.message.body()));
    match entry.current_draft() {
        Some(draft) => out.push_str(&format!("\n--- draft ---\n{draft}\n-------------\n")),
        None if entry.replyable => out.push_str("\n(no draft, use 'edit' to write one)\n"),
        None => out.push_str("\n(no reply needed)\n"),
    }
    out
}

/// Interactive review session over a board.
pub struct ReviewConsole {
    board: Arc<ReviewBoard>,
    gateway: Arc<dyn DispatchGateway>,
    dispatch_timeout: Duration,
}

impl ReviewConsole {
    pub fn new(
        board: Arc<ReviewBoard>,
        gateway: Arc<dyn DispatchGateway>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            board,
            gateway,
            dispatch_timeout,
        }
    }

    /// Entry id for a 1-based index.
    async fn resolve(&self, n: usize) -> Result<ReviewEntry, String> {
        self.board
            .entries()
            .await
            .into_iter()
            .nth(n - 1)
            .ok_or_else(|| format!("no entry #{n}"))
    }

    /// Run a command that needs no further input. `Edit` needs the new
    /// text; use `apply_edit`.
    pub async fn execute(&self, command: &ReviewCommand) -> String {
        match self.try_execute(command).await {
            Ok(out) | Err(out) => out,
        }
    }

    async fn try_execute(&self, command: &ReviewCommand) -> Result<String, String> {
        match command {
            ReviewCommand::List(filter) => {
                let entries = self.board.entries().await;
                let lines: Vec<_> = entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| filter.is_none_or(|s| e.status == s))
                    .map(|(i, e)| list_line(i + 1, e))
                    .collect();
                if lines.is_empty() {
                    Ok("(no entries)".into())
                } else {
                    Ok(lines.join("\n"))
                }
            }
            ReviewCommand::Show(n) => Ok(detail(*n, &self.resolve(*n).await?)),
            ReviewCommand::Edit(n) => {
                let entry = self.resolve(*n).await?;
                Ok(format!(
                    "Enter the new draft for #{n} ({}), end with a lone '.':",
                    entry.message.subject()
                ))
            }
            ReviewCommand::Approve(n) => {
                let entry = self.resolve(*n).await?;
                self.board
                    .approve(entry.id(), self.gateway.as_ref(), self.dispatch_timeout)
                    .await
                    .map(|sent| format!("#{n} sent to {}", sent.message.reply_address()))
                    .map_err(|e| format!("#{n}: {e}"))
            }
            ReviewCommand::Reject(n) => {
                let entry = self.resolve(*n).await?;
                self.board
                    .reject(entry.id())
                    .await
                    .map(|_| format!("#{n} rejected"))
                    .map_err(|e| format!("#{n}: {e}"))
            }
            ReviewCommand::Summary => Ok(self.board.summary().await.render()),
            ReviewCommand::Export(dir) => {
                let entries = self.board.entries().await;
                export::write_csv(&dir.join("triage.csv"), &entries)
                    .await
                    .map_err(|e| format!("export failed: {e}"))?;
                let records = export::write_records(dir, &entries)
                    .await
                    .map_err(|e| format!("export failed: {e}"))?;
                Ok(format!(
                    "Wrote {} rows and {} draft records to {}",
                    entries.len(),
                    records.len(),
                    dir.display()
                ))
            }
            ReviewCommand::Help => Ok(HELP.into()),
            ReviewCommand::Quit => Ok(String::new()),
        }
    }

    /// Store an operator-written draft for entry `n`.
    pub async fn apply_edit(&self, n: usize, text: &str) -> String {
        let entry = match self.resolve(n).await {
            Ok(entry) => entry,
            Err(e) => return e,
        };
        match self.board.edit(entry.id(), text).await {
            Ok(_) => format!("#{n} draft updated"),
            Err(e) => format!("#{n}: {e}"),
        }
    }

    /// Read commands from `input` until `quit` or EOF, writing output to
    /// stdout.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, input: R) {
        let mut lines = input.lines();

        println!("{HELP}\n");
        println!("{}", self.execute(&ReviewCommand::List(None)).await);
        eprint!("> ");

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break, // EOF
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                eprint!("> ");
                continue;
            }

            match ReviewCommand::parse(line) {
                Ok(ReviewCommand::Quit) => break,
                Ok(ReviewCommand::Edit(n)) => {
                    println!("{}", self.execute(&ReviewCommand::Edit(n)).await);
                    let mut text = Vec::new();
                    loop {
                        match lines.next_line().await {
                            Ok(Some(l)) if l.trim() == "." => break,
                            Ok(Some(l)) => text.push(l),
                            Ok(None) | Err(_) => break,
                        }
                    }
                    println!("{}", self.apply_edit(n, &text.join("\n")).await);
                }
                Ok(command) => println!("{}", self.execute(&command).await),
                Err(usage) => println!("{usage}"),
            }
            eprint!("> ");
        }
    }
}

/// Run the console on stdin.
pub async fn run_console(
    board: Arc<ReviewBoard>,
    gateway: Arc<dyn DispatchGateway>,
    dispatch_timeout: Duration,
) {
    let console = ReviewConsole::new(board, gateway, dispatch_timeout);
    console.run(BufReader::new(tokio::io::stdin())).await;
}
