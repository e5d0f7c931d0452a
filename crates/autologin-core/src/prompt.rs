//! The "ask the user for a value" capability.
//!
//! Everything that needs input from a human goes through [`Prompter`], so the
//! configuration dialog and the credential policy can be driven by canned
//! answers in tests and by a real terminal in the CLI.

use crate::{Error, Result};
use std::cell::RefCell;
use std::collections::VecDeque;

pub trait Prompter {
    /// Ask for a visible line of text
    fn input(&self, prompt: &str) -> Result<String>;

    /// Ask for a secret; the answer must not be echoed
    fn password(&self, prompt: &str) -> Result<String>;

    /// Ask a yes/no question until a valid answer is given
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Show an informational message between prompts
    fn notify(&self, message: &str);
}

/// Parse a yes/no answer the way the terminal dialog accepts them
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Prompter that replays a fixed list of answers in order.
///
/// Running out of answers behaves like the user pressing Ctrl-C at that
/// prompt, which is how tests model an interrupted dialog.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
    notices: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            asked: RefCell::new(Vec::new()),
            notices: RefCell::new(Vec::new()),
        }
    }

    /// Prompts that were shown, in order
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    /// Messages passed to [`Prompter::notify`]
    pub fn notices(&self) -> Vec<String> {
        self.notices.borrow().clone()
    }

    /// Number of answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next_answer(&self, prompt: &str) -> Result<String> {
        self.asked.borrow_mut().push(prompt.to_string());
        self.answers.borrow_mut().pop_front().ok_or(Error::Interrupted)
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
    }

    fn password(&self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        loop {
            let answer = self.next_answer(prompt)?;
            match parse_yes_no(&answer) {
                Some(value) => return Ok(value),
                None => self.notify("Invalid input. Please type 'y' for yes or 'n' for no."),
            }
        }
    }

    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }
}
