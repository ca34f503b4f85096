//! Interactive prompts.

use console::Term;
use dialoguer::Select;

use crate::error::{Result, ShipkitError};

use super::{Prompt, PromptOption, PromptResult, PromptType};

fn map_dialoguer_err(e: dialoguer::Error) -> ShipkitError {
    ShipkitError::Io(e.into())
}

/// Prompt the user for input.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    match &prompt.prompt_type {
        PromptType::Select { options } => prompt_select(prompt, options, term),
    }
}

fn prompt_select(prompt: &Prompt, options: &[PromptOption], term: &Term) -> Result<PromptResult> {
    let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();

    let default_idx = prompt
        .default
        .as_ref()
        .and_then(|d| options.iter().position(|o| o.value == *d))
        .unwrap_or(0);

    // Esc/q returns None, which the caller treats as an aborted selection.
    let selection = Select::new()
        .with_prompt(&prompt.question)
        .items(&labels)
        .default(default_idx)
        .interact_on_opt(term)
        .map_err(map_dialoguer_err)?;

    Ok(PromptResult::String(
        selection
            .and_then(|i| options.get(i))
            .map(|o| o.value.clone())
            .unwrap_or_default(),
    ))
}
