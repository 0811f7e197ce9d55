//! Instruction sent alongside every meal photo.

use std::fs;
use std::path::Path;

use crate::ai::ConfigError;

/// Prompt name used in log fields.
pub const NUTRITION_PROMPT_NAME: &str = "meal_nutrition";

pub const DEFAULT_NUTRITION_PROMPT: &str = r#"As a registered dietitian, analyze the provided image of a meal. Provide a nutritional breakdown including:

* Total Calories: [Value]
* Total Protein (grams): [Value]

Individual Items:
Item 1 - Calories: [Value], Protein (grams): [Value], Carbohydrates (%): [Value], Fat (%): [Value]
Item 2 - Calories: [Value], Protein (grams): [Value], Carbohydrates (%): [Value], Fat (%): [Value]
Item 3 - Calories: [Value], Protein (grams): [Value], Carbohydrates (%): [Value], Fat (%): [Value]
... (Continue for all items)

Assess the overall healthfulness of the meal. Provide a macronutrient breakdown for the *entire meal* as percentages:
Carbohydrates (%): [Value]
Protein (%): [Value]
Fat (%): [Value]

Mention any other relevant nutritional considerations. If any items are high in calories or have other nutritional concerns, suggest healthier alternatives. Be concise and use numerical values for macronutrients."#;

/// Resolve the instruction text: the contents of `path` if given, otherwise
/// [`DEFAULT_NUTRITION_PROMPT`].
///
/// Surrounding whitespace in the file is trimmed; a file with nothing else in
/// it is an error rather than a silent fallback.
pub fn load_instruction(path: Option<&Path>) -> Result<String, ConfigError> {
    let Some(path) = path else {
        return Ok(DEFAULT_NUTRITION_PROMPT.to_string());
    };

    let text = fs::read_to_string(path).map_err(|source| ConfigError::PromptFile {
        path: path.to_path_buf(),
        source,
    })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ConfigError::EmptyPrompt(path.to_path_buf()));
    }

    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_prompt() {
        let prompt = load_instruction(None).unwrap();
        assert!(prompt.contains("registered dietitian"));
        assert!(prompt.contains("Total Calories"));
        assert!(prompt.contains("healthier alternatives"));
    }

    #[test]
    fn test_prompt_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  Count the calories in this meal.  ").unwrap();

        let prompt = load_instruction(Some(file.path())).unwrap();
        assert_eq!(prompt, "Count the calories in this meal.");
    }

    #[test]
    fn test_empty_prompt_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let err = load_instruction(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPrompt(_)));
    }

    #[test]
    fn test_missing_prompt_file() {
        let err = load_instruction(Some(Path::new("/nonexistent/prompt.txt"))).unwrap_err();
        assert!(matches!(err, ConfigError::PromptFile { .. }));
    }
}
