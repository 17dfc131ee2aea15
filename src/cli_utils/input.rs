use crate::cli_utils::{CliError, CliResult};
use dialoguer::Input as DialoguerInput;

/// Input utilities
pub struct Input;

impl Input {
    /// Get a non-empty string from user input
    pub fn get_string(prompt: &str) -> CliResult<String> {
        let input: String = DialoguerInput::new()
            .with_prompt(prompt)
            .interact_text()?;

        let input = input.trim().to_string();
        if input.is_empty() {
            return Err(CliError::ValidationError(format!("{} must not be empty", prompt)));
        }
        Ok(input)
    }

    /// Get a non-negative integer, e.g. a count or a column index
    pub fn get_usize(prompt: &str) -> CliResult<usize> {
        let input: String = DialoguerInput::new()
            .with_prompt(prompt)
            .interact_text()?;

        parse_usize(&input)
    }

    /// Get a non-negative integer, offering a default
    pub fn get_usize_or(prompt: &str, default: usize) -> CliResult<usize> {
        let input: String = DialoguerInput::new()
            .with_prompt(prompt)
            .default(default.to_string())
            .interact_text()?;

        parse_usize(&input)
    }
}

fn parse_usize(input: &str) -> CliResult<usize> {
    input
        .trim()
        .parse::<usize>()
        .map_err(|_| CliError::ValidationError(format!("'{}' is not a valid number", input.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usize() {
        assert_eq!(parse_usize(" 4 ").unwrap(), 4);
        assert!(matches!(parse_usize("-1"), Err(CliError::ValidationError(_))));
        assert!(parse_usize("two").is_err());
    }
}
