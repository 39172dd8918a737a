use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use tenq_core::{Operator, PipelineError, PipelineResult};

/// Terminal prompts for the interactive pipeline.
pub struct DialoguerOperator {
    theme: ColorfulTheme,
}

impl DialoguerOperator {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Hidden input, used for API keys.
    pub fn secret(&mut self, prompt: &str) -> PipelineResult<String> {
        Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact()
            .map_err(PipelineError::operator)
    }
}

impl Default for DialoguerOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for DialoguerOperator {
    fn input(&mut self, prompt: &str) -> PipelineResult<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text()
            .map_err(PipelineError::operator)
    }

    fn confirm(&mut self, prompt: &str) -> PipelineResult<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(PipelineError::operator)
    }

    fn select(&mut self, prompt: &str, items: &[String]) -> PipelineResult<Option<usize>> {
        let mut choices = vec!["0: none of these, fetch live".to_string()];
        choices.extend(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{}: {}", i + 1, item)),
        );

        let picked = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(&choices)
            .default(if items.is_empty() { 0 } else { 1 })
            .interact()
            .map_err(PipelineError::operator)?;
        Ok(picked.checked_sub(1))
    }

    fn show(&mut self, message: &str) {
        println!("{}", message);
    }
}
