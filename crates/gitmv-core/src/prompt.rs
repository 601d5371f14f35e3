//! Operator prompting collaborator.
//!
//! The engine asks typed [`Question`]s; front ends decide how to render them
//! (the CLI looks the wording up in the message catalog). Every prompt blocks
//! until answered.

use crate::error::{GitmvError, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Everything the engine may ask the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    /// Export with uncommitted changes present?
    ContinueWithDirtyTree,
    /// Final go-ahead after the export summary.
    ProceedWithExport,
    /// Pick the branches to export.
    SelectExportBranches,
    /// Destination has no commits; use init mode?
    UseInitMode,
    /// Pick the snapshot branches to reconcile.
    SelectImportBranches,
    /// Map any source branch onto a different local name?
    CustomizeMapping,
    /// What to do with one source branch during mapping.
    MapBranch { source: String },
    /// Which existing local branch should receive `source`.
    ChooseExistingTarget { source: String },
    /// New local name for `source`.
    NewBranchName { source: String },
    /// `branch` does not exist locally.
    MissingLocalBranch { branch: String },
    /// Merge `remote_ref` into `branch`?
    ConfirmMerge { remote_ref: String, branch: String },
    /// Retry the merge of `branch` allowing unrelated histories?
    RetryUnrelated { branch: String },
    /// Push created and merged branches to `url`?
    PushToRemote { url: String },
}

/// Options offered by single-choice questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    CreateAndCheckout,
    Skip,
    KeepName,
    MapToExisting,
    MapToNew,
    Branch(String),
}

pub trait Prompter {
    fn confirm(&self, question: &Question, default: bool) -> Result<bool>;

    /// Returns the index of the chosen entry in `choices`.
    fn select(&self, question: &Question, choices: &[Choice]) -> Result<usize>;

    /// Returns the chosen subset of `choices`, in `choices` order.
    fn multi_select(
        &self,
        question: &Question,
        choices: &[String],
        defaults: &[String],
    ) -> Result<Vec<String>>;

    fn text(&self, question: &Question) -> Result<String>;
}

/// A pre-recorded answer for [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Index into the offered choices.
    Pick(usize),
    /// Names for a multi-select.
    Names(Vec<String>),
    Text(String),
}

/// Answers questions from a queue (for testing). When the queue is empty,
/// confirms take their default, selects take the first entry, and
/// multi-selects take their defaults.
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<Question>>,
}

impl Default for ScriptedPrompter {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> Vec<Question> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn next(&self, question: &Question) -> Option<Answer> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.clone());
        }
        self.answers.lock().ok().and_then(|mut a| a.pop_front())
    }
}

fn unexpected(question: &Question, answer: &Answer) -> GitmvError {
    GitmvError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("scripted answer {answer:?} does not fit {question:?}"),
    ))
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &Question, default: bool) -> Result<bool> {
        match self.next(question) {
            None => Ok(default),
            Some(Answer::Yes) => Ok(true),
            Some(Answer::No) => Ok(false),
            Some(other) => Err(unexpected(question, &other)),
        }
    }

    fn select(&self, question: &Question, choices: &[Choice]) -> Result<usize> {
        match self.next(question) {
            None => Ok(0),
            Some(Answer::Pick(i)) if i < choices.len() => Ok(i),
            Some(other) => Err(unexpected(question, &other)),
        }
    }

    fn multi_select(
        &self,
        question: &Question,
        choices: &[String],
        defaults: &[String],
    ) -> Result<Vec<String>> {
        match self.next(question) {
            None => Ok(defaults.to_vec()),
            Some(Answer::Names(names)) => Ok(choices
                .iter()
                .filter(|c| names.contains(c))
                .cloned()
                .collect()),
            Some(other) => Err(unexpected(question, &other)),
        }
    }

    fn text(&self, question: &Question) -> Result<String> {
        match self.next(question) {
            Some(Answer::Text(t)) => Ok(t),
            None => Err(GitmvError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("no scripted answer for {question:?}"),
            ))),
            Some(other) => Err(unexpected(question, &other)),
        }
    }
}
