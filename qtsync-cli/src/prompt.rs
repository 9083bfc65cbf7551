//! Terminal prompts backed by `inquire`.

use anyhow::Context;
use colored::*;
use inquire::{Confirm, InquireError, Password, PasswordDisplayMode, Select, Text};
use qtsync_core::credentials::{CredentialError, PromptReason, TokenPrompt};

/// Asks for a Questrade refresh token on the terminal.
pub struct TerminalPrompt;

impl TokenPrompt for TerminalPrompt {
    fn prompt_for_token(&self, reason: PromptReason) -> Result<String, CredentialError> {
        match reason {
            PromptReason::Initial => {
                eprintln!("{}", "No Questrade refresh token is stored.".yellow());
            }
            PromptReason::Recovery => {
                eprintln!(
                    "{}",
                    "The stored Questrade refresh token was rejected.".yellow()
                );
                eprintln!(
                    "Generate a new manual authorization token in the Questrade API hub."
                );
            }
        }

        match secret("Questrade refresh token:") {
            Ok(token) => Ok(token),
            // Treat an aborted prompt as an empty answer.
            Err(InquireError::OperationCanceled) => Ok(String::new()),
            Err(e) => Err(CredentialError::Prompt(e.to_string())),
        }
    }
}

/// Masked single-entry input.
pub fn secret(message: &str) -> Result<String, InquireError> {
    Password::new(message)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .map(|s| s.trim().to_string())
}

pub fn text(message: &str) -> anyhow::Result<String> {
    let value = Text::new(message).prompt().context("Prompt failed")?;
    Ok(value.trim().to_string())
}

pub fn confirm(message: &str) -> anyhow::Result<bool> {
    Confirm::new(message)
        .with_default(false)
        .prompt()
        .context("Prompt failed")
}

/// Pick one of `options`; `None` when the user cancels.
pub fn select<T: std::fmt::Display>(message: &str, options: Vec<T>) -> anyhow::Result<Option<T>> {
    match Select::new(message, options).with_page_size(10).prompt() {
        Ok(choice) => Ok(Some(choice)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e).context("Prompt failed"),
    }
}
