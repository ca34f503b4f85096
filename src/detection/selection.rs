//! Disambiguation among detected candidates.

use std::path::Path;

use crate::capability::Capability;
use crate::error::{Result, ShipkitError};
use crate::ui::{Prompt, PromptOption, PromptResult, PromptType, UserInterface};

/// Prompt key used when asking which candidate to use.
pub const SELECTION_PROMPT_KEY: &str = "framework";

/// Pick one capability out of `candidates`.
///
/// Unattended runs take the first candidate in registration order; attended
/// runs ask, and anything other than one of the candidates' names aborts.
pub fn choose(
    mut candidates: Vec<Box<dyn Capability>>,
    unattended: bool,
    project_root: &Path,
    ui: &mut dyn UserInterface,
) -> Result<Box<dyn Capability>> {
    if candidates.is_empty() {
        return Err(ShipkitError::NoSupportedFramework {
            path: project_root.to_path_buf(),
        });
    }

    if candidates.len() == 1 || unattended {
        return Ok(candidates.swap_remove(0));
    }

    let options: Vec<PromptOption> = candidates
        .iter()
        .map(|c| PromptOption {
            label: c.name().to_string(),
            value: c.name().to_string(),
        })
        .collect();

    let prompt = Prompt {
        key: SELECTION_PROMPT_KEY.to_string(),
        question: "More than one framework detected. Which one would you like to use?"
            .to_string(),
        prompt_type: PromptType::Select { options },
        default: Some(candidates[0].name().to_string()),
    };

    let answer = match ui.prompt(&prompt) {
        Ok(PromptResult::String(answer)) => answer,
        Err(e) => {
            return Err(ShipkitError::SelectionAborted {
                message: e.to_string(),
            })
        }
    };

    match candidates.iter().position(|c| c.name() == answer) {
        Some(index) => Ok(candidates.swap_remove(index)),
        None if answer.is_empty() => Err(ShipkitError::SelectionAborted {
            message: "no framework selected".to_string(),
        }),
        None => Err(ShipkitError::SelectionAborted {
            message: format!("'{}' is not one of the detected frameworks", answer),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ComposeCapability, DescriptorCapability};
    use crate::ui::MockUI;

    fn candidates() -> Vec<Box<dyn Capability>> {
        vec![
            Box::new(DescriptorCapability::new()),
            Box::new(ComposeCapability::new()),
        ]
    }

    #[test]
    fn no_candidates_fails() {
        let mut ui = MockUI::new();
        let err = choose(Vec::new(), true, Path::new("/srv/app"), &mut ui)
            .err()
            .unwrap();
        assert!(matches!(err, ShipkitError::NoSupportedFramework { .. }));
    }

    #[test]
    fn single_candidate_is_chosen_without_prompting() {
        let mut ui = MockUI::new();
        let single: Vec<Box<dyn Capability>> = vec![Box::new(ComposeCapability::new())];
        let chosen = choose(single, false, Path::new("."), &mut ui).unwrap();
        assert_eq!(chosen.name(), "docker-compose");
        assert!(ui.prompts_shown().is_empty());
    }

    #[test]
    fn unattended_picks_first_registered() {
        let mut ui = MockUI::new();
        let chosen = choose(candidates(), true, Path::new("."), &mut ui).unwrap();
        assert_eq!(chosen.name(), "service.yml");
        assert!(ui.prompts_shown().is_empty());
    }

    #[test]
    fn attended_uses_the_answer() {
        let mut ui = MockUI::new();
        ui.set_prompt_response(SELECTION_PROMPT_KEY, "docker-compose");
        let chosen = choose(candidates(), false, Path::new("."), &mut ui).unwrap();
        assert_eq!(chosen.name(), "docker-compose");
        assert_eq!(ui.prompts_shown(), &[SELECTION_PROMPT_KEY]);
    }

    #[test]
    fn unknown_answer_aborts() {
        let mut ui = MockUI::new();
        ui.set_prompt_response(SELECTION_PROMPT_KEY, "cobol");
        let err = choose(candidates(), false, Path::new("."), &mut ui)
            .err()
            .unwrap();
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn failed_prompt_aborts() {
        let mut ui = MockUI::new();
        ui.fail_prompts();
        let err = choose(candidates(), false, Path::new("."), &mut ui)
            .err()
            .unwrap();
        assert!(matches!(err, ShipkitError::SelectionAborted { .. }));
    }
}
