//! Line-oriented terminal front end: a [`Prompter`] that reads answers from
//! stdin and a [`Narrator`] that renders notices on stdout.
//!
//! Prompts go to stderr so they never mix into redirected narration.

use gitmv_core::i18n::Label;
use gitmv_core::narrate::Level;
use gitmv_core::{
    BranchOutcome, Catalog, Choice, GitmvError, Narrator, Notice, Prompter, Question, Result,
};
use std::io::{self, BufRead, Write};
use std::sync::{Mutex, MutexGuard};

const RULE: &str = "==================================================";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn closed_input(question: &Question) -> GitmvError {
    GitmvError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("input closed while asking {question:?}"),
    ))
}

// ── Prompter ──

pub struct TerminalPrompter<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    catalog: Catalog,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio(catalog: Catalog) -> Self {
        Self::new(io::stdin().lock(), io::stderr(), catalog)
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W, catalog: Catalog) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            catalog,
        }
    }

    fn say(&self, text: &str) -> Result<()> {
        let mut out = lock(&self.output);
        write!(out, "{text}")?;
        out.flush()?;
        Ok(())
    }

    /// Next trimmed line, or `None` at end of input.
    fn read_line(&self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = lock(&self.input).read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn invalid(&self) -> Result<()> {
        self.say(&format!("{}\n", self.catalog.label(Label::InvalidSelection)))
    }

    #[cfg(test)]
    fn into_inner(self) -> (R, W) {
        (
            self.input.into_inner().unwrap_or_else(|e| e.into_inner()),
            self.output.into_inner().unwrap_or_else(|e| e.into_inner()),
        )
    }
}

/// Parse `1,3,5` into zero-based indices below `len`.
fn parse_indices(raw: &str, len: usize) -> Option<Vec<usize>> {
    let mut picked = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let n: usize = part.parse().ok()?;
        if n == 0 || n > len {
            return None;
        }
        if !picked.contains(&(n - 1)) {
            picked.push(n - 1);
        }
    }
    if picked.is_empty() {
        None
    } else {
        Some(picked)
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm(&self, question: &Question, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let yes = self.catalog.label(Label::Yes);
        loop {
            self.say(&format!("{} {hint} ", self.catalog.question(question)))?;
            let Some(answer) = self.read_line()? else {
                return Ok(default);
            };
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                other if other == yes => return Ok(true),
                _ => self.invalid()?,
            }
        }
    }

    fn select(&self, question: &Question, choices: &[Choice]) -> Result<usize> {
        let mut menu = format!("\n{}\n", self.catalog.question(question));
        for (i, choice) in choices.iter().enumerate() {
            menu.push_str(&format!("  {}. {}\n", i + 1, self.catalog.choice(choice)));
        }
        self.say(&menu)?;
        loop {
            self.say(self.catalog.label(Label::SelectNumber))?;
            let answer = self.read_line()?.ok_or_else(|| closed_input(question))?;
            match parse_indices(&answer, choices.len()).as_deref() {
                Some([index]) => return Ok(*index),
                _ => self.invalid()?,
            }
        }
    }

    fn multi_select(
        &self,
        question: &Question,
        choices: &[String],
        defaults: &[String],
    ) -> Result<Vec<String>> {
        let mut menu = format!("\n{}\n", self.catalog.question(question));
        for (i, choice) in choices.iter().enumerate() {
            let mark = if defaults.contains(choice) { "x" } else { " " };
            menu.push_str(&format!("  [{mark}] {}. {choice}\n", i + 1));
        }
        menu.push_str(self.catalog.label(Label::MultiSelectHint));
        menu.push('\n');
        self.say(&menu)?;
        loop {
            self.say("> ")?;
            let answer = self.read_line()?.ok_or_else(|| closed_input(question))?;
            if answer.is_empty() {
                return Ok(choices
                    .iter()
                    .filter(|c| defaults.contains(c))
                    .cloned()
                    .collect());
            }
            if answer.eq_ignore_ascii_case("all") {
                return Ok(choices.to_vec());
            }
            match parse_indices(&answer, choices.len()) {
                Some(mut indices) => {
                    indices.sort_unstable();
                    return Ok(indices.into_iter().map(|i| choices[i].clone()).collect());
                }
                None => self.invalid()?,
            }
        }
    }

    fn text(&self, question: &Question) -> Result<String> {
        self.say(&self.catalog.question(question))?;
        self.read_line()?.ok_or_else(|| closed_input(question))
    }
}

// ── Narrator ──

pub struct ConsoleNarrator<W> {
    out: Mutex<W>,
    catalog: Catalog,
}

impl ConsoleNarrator<io::Stdout> {
    pub fn stdout(catalog: Catalog) -> Self {
        Self::new(io::stdout(), catalog)
    }
}

impl<W: Write> ConsoleNarrator<W> {
    pub fn new(out: W, catalog: Catalog) -> Self {
        Self {
            out: Mutex::new(out),
            catalog,
        }
    }

    fn render(&self, notice: &Notice) -> String {
        let text = self.catalog.notice(notice);
        match notice {
            Notice::Summary(outcomes) => format!("\n{text}\n{}", self.table(outcomes)),
            Notice::ExportComplete { .. }
            | Notice::ImportComplete { .. }
            | Notice::DryRunComplete => format!("\n{RULE}\n{text}\n{RULE}"),
            Notice::BranchStart { .. } => format!("\n{text}"),
            _ => match notice.level() {
                Level::Plain => text,
                Level::Info => format!("ℹ {text}"),
                Level::Success => format!("✓ {text}"),
                Level::Warning => {
                    format!("⚠ {}: {text}", self.catalog.label(Label::WarningPrefix))
                }
                Level::Error => format!("✗ {}: {text}", self.catalog.label(Label::ErrorPrefix)),
            },
        }
    }

    fn table(&self, outcomes: &[BranchOutcome]) -> String {
        let branch_col = self.catalog.label(Label::BranchColumn);
        let status_col = self.catalog.label(Label::StatusColumn);
        let conflicts_col = self.catalog.label(Label::ConflictsColumn);
        let width = outcomes
            .iter()
            .map(|o| o.branch.chars().count())
            .chain(std::iter::once(branch_col.chars().count()))
            .max()
            .unwrap_or(0);

        let mut s = format!("{branch_col:<width$}  {status_col:<10}  {conflicts_col}\n");
        for o in outcomes {
            let conflicts = if o.conflicted_paths.is_empty() {
                "-".to_string()
            } else {
                o.conflicted_paths.join(", ")
            };
            s.push_str(&format!(
                "{:<width$}  {:<10}  {conflicts}\n",
                o.branch,
                o.status.as_str()
            ));
        }
        s
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write> Narrator for ConsoleNarrator<W> {
    fn notify(&self, notice: Notice) {
        let line = self.render(&notice);
        let mut out = lock(&self.out);
        let _ = writeln!(out, "{line}");
    }
}

/// Print a fatal error in the operator's language.
pub fn report_error(catalog: &Catalog, err: &anyhow::Error) {
    eprintln!("✗ {}: {err:#}", catalog.label(Label::ErrorPrefix));
}
