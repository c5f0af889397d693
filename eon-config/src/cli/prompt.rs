//! Interactive input used by providers and the wizard.
//!
//! [`TerminalPrompter`] renders dialoguer widgets on stderr.
//! [`ScriptedPrompter`] answers from a fixed list of lines, which is how
//! unattended runs and the end-to-end tests drive the wizard.

use std::{
    collections::VecDeque,
    fs,
    path::Path,
    sync::Mutex,
};

use dialoguer::{
    Confirm, Input, Password, Select, console::Term, theme::ColorfulTheme,
};
use tracing::warn;

use crate::error::SetupError;

/// Validator for free-text answers. `Err` carries the message shown to the
/// user.
pub type AnswerCheck<'a> = &'a (dyn Fn(&str) -> Result<(), String> + Sync);

pub trait Prompter: Send + Sync {
    /// Free text; an empty answer falls back to `default` when one is given.
    fn input(
        &self,
        prompt: &str,
        default: Option<&str>,
    ) -> Result<String, SetupError>;

    /// Free text, asked again until `check` accepts it.
    fn input_validated(
        &self,
        prompt: &str,
        default: Option<&str>,
        check: AnswerCheck<'_>,
    ) -> Result<String, SetupError>;

    fn password(&self, prompt: &str) -> Result<String, SetupError>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, SetupError>;

    /// Index into `items` of the chosen entry.
    fn select(
        &self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> Result<usize, SetupError>;

    /// Block until the user acknowledges `message`.
    fn pause(&self, message: &str) -> Result<(), SetupError>;
}

pub struct TerminalPrompter {
    term: Term,
    theme: ColorfulTheme,
}

impl std::fmt::Debug for TerminalPrompter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalPrompter")
            .field("term", &self.term)
            .finish_non_exhaustive()
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self {
            term: Term::stderr(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for TerminalPrompter {
    fn input(
        &self,
        prompt: &str,
        default: Option<&str>,
    ) -> Result<String, SetupError> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text_on(&self.term)?.trim().to_string())
    }

    fn input_validated(
        &self,
        prompt: &str,
        default: Option<&str>,
        check: AnswerCheck<'_>,
    ) -> Result<String, SetupError> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(|answer: &String| check(answer.trim()));
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text_on(&self.term)?.trim().to_string())
    }

    fn password(&self, prompt: &str) -> Result<String, SetupError> {
        Ok(Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_on(&self.term)?)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, SetupError> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact_on(&self.term)?)
    }

    fn select(
        &self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> Result<usize, SetupError> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact_on(&self.term)?)
    }

    fn pause(&self, message: &str) -> Result<(), SetupError> {
        self.term
            .write_line(message)
            .and_then(|()| self.term.read_line())
            .map_err(dialoguer::Error::from)?;
        Ok(())
    }
}

/// Answers prompts from a queue, one answer per prompt.
///
/// Empty answers select the default. Answers a real widget would reject
/// (a failed check, an unknown menu entry, a non yes/no confirmation) are
/// consumed and the next answer is tried, mirroring a re-prompt.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }

    /// One answer per line; a trailing newline does not add an answer.
    pub fn from_file(path: &Path) -> Result<Self, SetupError> {
        let contents =
            fs::read_to_string(path).map_err(|e| SetupError::read(path, e))?;
        Ok(Self::new(contents.lines()))
    }

    pub fn remaining(&self) -> usize {
        self.queue().len()
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        self.answers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next(&self, prompt: &str) -> Result<String, SetupError> {
        self.queue()
            .pop_front()
            .map(|answer| answer.trim().to_string())
            .ok_or_else(|| SetupError::ScriptExhausted {
                prompt: prompt.to_string(),
            })
    }
}

impl Prompter for ScriptedPrompter {
    fn input(
        &self,
        prompt: &str,
        default: Option<&str>,
    ) -> Result<String, SetupError> {
        let answer = self.next(prompt)?;
        Ok(match default {
            Some(default) if answer.is_empty() => default.to_string(),
            _ => answer,
        })
    }

    fn input_validated(
        &self,
        prompt: &str,
        default: Option<&str>,
        check: AnswerCheck<'_>,
    ) -> Result<String, SetupError> {
        loop {
            let answer = self.input(prompt, default)?;
            match check(&answer) {
                Ok(()) => return Ok(answer),
                Err(message) => warn!("{prompt}: {message}"),
            }
        }
    }

    fn password(&self, prompt: &str) -> Result<String, SetupError> {
        self.next(prompt)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, SetupError> {
        loop {
            let answer = self.next(prompt)?.to_ascii_lowercase();
            match answer.as_str() {
                "" => return Ok(default),
                "y" | "yes" | "true" => return Ok(true),
                "n" | "no" | "false" => return Ok(false),
                other => warn!("{prompt}: '{other}' is not a yes/no answer"),
            }
        }
    }

    fn select(
        &self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> Result<usize, SetupError> {
        loop {
            let answer = self.next(prompt)?;
            if answer.is_empty() {
                return Ok(default);
            }
            if let Some(index) = items.iter().position(|item| *item == answer)
            {
                return Ok(index);
            }
            if let Ok(index) = answer.parse::<usize>()
                && index < items.len()
            {
                return Ok(index);
            }
            warn!("{prompt}: '{answer}' is not one of the choices");
        }
    }

    fn pause(&self, message: &str) -> Result<(), SetupError> {
        self.next(message).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_answer_takes_default() {
        let prompter = ScriptedPrompter::new(["", "", "custom"]);
        assert_eq!(prompter.input("Name", Some("eon")).unwrap(), "eon");
        assert!(prompter.confirm("Continue?", true).unwrap());
        assert_eq!(prompter.input("Name", Some("eon")).unwrap(), "custom");
    }

    #[test]
    fn rejected_answer_consumes_next_line() {
        let prompter = ScriptedPrompter::new(["bad", "sk-ant-good"]);
        let check = |value: &str| -> Result<(), String> {
            if value.starts_with("sk-ant") {
                Ok(())
            } else {
                Err("wrong prefix".into())
            }
        };
        let answer = prompter.input_validated("Key", None, &check).unwrap();
        assert_eq!(answer, "sk-ant-good");
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn select_accepts_label_or_index() {
        let items = vec!["Modify".to_string(), "Fresh".to_string()];
        let prompter = ScriptedPrompter::new(["Fresh", "0", "7", ""]);
        assert_eq!(prompter.select("Mode", &items, 0).unwrap(), 1);
        assert_eq!(prompter.select("Mode", &items, 0).unwrap(), 0);
        assert_eq!(prompter.select("Mode", &items, 1).unwrap(), 1);
    }

    #[test]
    fn exhausted_script_is_an_error() {
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = prompter.confirm("Continue?", true).unwrap_err();
        assert!(matches!(
            err,
            SetupError::ScriptExhausted { prompt } if prompt == "Continue?"
        ));
    }
}
