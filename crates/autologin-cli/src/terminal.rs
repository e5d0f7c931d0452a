use autologin_core::{Error, Prompter, Result};
use console::{Key, Term};
use dialoguer::theme::{ColorfulTheme, Theme};
use dialoguer::{Confirm, Input};
use std::io::{self, ErrorKind};

/// Prompts on the controlling terminal. Password input is not echoed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

fn io_prompt_error(err: io::Error) -> Error {
    match err.kind() {
        ErrorKind::Interrupted => Error::Interrupted,
        _ => Error::Prompt(err.to_string()),
    }
}

fn prompt_error(err: dialoguer::Error) -> Error {
    match err {
        dialoguer::Error::IO(io) => io_prompt_error(io),
    }
}

fn render_error(err: std::fmt::Error) -> Error {
    Error::Prompt(err.to_string())
}

impl Prompter for TerminalPrompter {
    fn input(&self, prompt: &str) -> Result<String> {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    fn password(&self, prompt: &str) -> Result<String> {
        read_hidden(&Term::stderr(), &ColorfulTheme::default(), prompt)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact()
            .map_err(prompt_error)
    }

    fn notify(&self, message: &str) {
        println!("{}", message);
    }
}

/// Read a line without echo one key at a time.
///
/// The terminal is only in raw mode while a key is being read, so Ctrl-C
/// arrives as a key and the original mode is already back in place when
/// [`Error::Interrupted`] is returned.
fn read_hidden(term: &Term, theme: &dyn Theme, prompt: &str) -> Result<String> {
    if !term.is_term() {
        return Err(Error::Prompt("not a terminal".to_string()));
    }

    let mut rendered = String::new();
    theme
        .format_password_prompt(&mut rendered, prompt)
        .map_err(render_error)?;
    term.write_str(&rendered).map_err(io_prompt_error)?;

    let mut secret = String::new();
    while !edit_secret(&mut secret, term.read_key_raw().map_err(io_prompt_error)?)? {}

    let mut done = String::new();
    theme
        .format_password_prompt_selection(&mut done, prompt)
        .map_err(render_error)?;
    term.clear_line().map_err(io_prompt_error)?;
    term.write_line(&done).map_err(io_prompt_error)?;

    Ok(secret)
}

/// Apply one key to the secret being typed. Returns `true` once it is complete.
fn edit_secret(secret: &mut String, key: Key) -> Result<bool> {
    match key {
        Key::Enter => Ok(true),
        Key::CtrlC => Err(Error::Interrupted),
        Key::Backspace => {
            secret.pop();
            Ok(false)
        }
        Key::Char(c) if !c.is_control() => {
            secret.push(c);
            Ok(false)
        }
        _ => Ok(false),
    }
}
