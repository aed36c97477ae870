use crate::language::Language;

/// Instruction block sent with every translation request.
///
/// The wording is part of the remote contract; changing it changes how the
/// model formats its reply.
#[derive(Debug, Clone, Default)]
pub struct TranslationPrompt {
    file_description: Option<String>,
}

impl TranslationPrompt {
    pub fn new(file_description: Option<String>) -> Self {
        let file_description = file_description.filter(|value| !value.is_empty());
        Self { file_description }
    }

    pub fn file_description(&self) -> Option<&str> {
        self.file_description.as_deref()
    }

    pub fn render(&self, texts: &[String], target_lang: &str) -> Result<String, serde_json::Error> {
        let json_text = serde_json::to_string_pretty(texts)?;
        let count = texts.len();

        let mut prompt = String::with_capacity(json_text.len() + 1024);
        prompt.push('\n');
        prompt.push_str("You are professional translator.\n");
        prompt.push_str(&format!(
            "You will receive a JSON string containing a list of {count} texts.\n"
        ));
        prompt.push_str(&format!(
            "Your task is to translate all strings in the list to {target_lang}.\n"
        ));
        if let Some(description) = &self.file_description {
            prompt.push_str(
                "Please translate the texts to fit the context described in the file description below.\n",
            );
            prompt.push_str(&format!("File description: {description}\n"));
        }
        prompt.push('\n');
        prompt.push_str("Note:\n");
        prompt.push_str("- Maintain any special characters, tab, enter, bullet list, unicode characters, numbers, and formatting within each text segment.\n");
        prompt.push_str("- Ensure that there are no extra newline characters, spaces, tabs, newlines\n");
        prompt.push_str("- If a text segment appears to be programming code, do not translate it.\n");
        prompt.push_str(&format!(
            "- The output must be array of {count} translated texts, and must preserve any duplicate texts.\n"
        ));
        prompt.push_str("- Return only a JSON format representing the list of translated texts and can be directly parsed as a Python list of strings.\n");
        if target_lang == Language::Japanese.label() {
            prompt.push_str(
                "- Must translate texts in the dictionary form (plain form (辞書形 - jishokei))\n",
            );
        }
        prompt.push('\n');
        prompt.push_str("Input JSON:\n");
        prompt.push_str(&json_text);
        prompt.push('\n');

        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn renders_count_language_and_json_payload() {
        let prompt = TranslationPrompt::default()
            .render(&texts(&["Hello", "Xin chào"]), "French")
            .unwrap();

        assert!(prompt.starts_with("\nYou are professional translator.\n"));
        assert!(prompt.contains("a list of 2 texts."));
        assert!(prompt.contains("translate all strings in the list to French.\n"));
        assert!(prompt.contains("- The output must be array of 2 translated texts"));
        assert!(prompt.ends_with("Input JSON:\n[\n  \"Hello\",\n  \"Xin chào\"\n]\n"));
        assert!(!prompt.contains("File description"));
        assert!(!prompt.contains("jishokei"));
    }

    #[test]
    fn includes_file_description_when_set() {
        let prompt = TranslationPrompt::new(Some("Test cases for a recruiting module".into()))
            .render(&texts(&["Apply"]), "German")
            .unwrap();

        assert!(prompt.contains(
            "below.\nFile description: Test cases for a recruiting module\n\nNote:\n"
        ));
    }

    #[test]
    fn empty_description_is_ignored() {
        let prompt = TranslationPrompt::new(Some(String::new()));
        assert_eq!(prompt.file_description(), None);
    }

    #[test]
    fn description_is_inserted_verbatim() {
        let prompt = TranslationPrompt::new(Some("  Sales deck, Q3 \n".into()));
        assert_eq!(prompt.file_description(), Some("  Sales deck, Q3 \n"));

        let rendered = prompt.render(&texts(&["Revenue"]), "French").unwrap();
        assert!(rendered.contains("File description:   Sales deck, Q3 \n\n"));
    }

    #[test]
    fn japanese_requires_plain_form() {
        let prompt = TranslationPrompt::default()
            .render(&texts(&["Open the file"]), "Japanese")
            .unwrap();
        assert!(prompt.contains(
            "Python list of strings.\n- Must translate texts in the dictionary form (plain form (辞書形 - jishokei))\n\nInput JSON:"
        ));
    }

    #[test]
    fn escapes_control_characters_but_not_unicode() {
        let prompt = TranslationPrompt::default()
            .render(&texts(&["a\tb\nc", "日本語"]), "English")
            .unwrap();
        assert!(prompt.contains("\"a\\tb\\nc\""));
        assert!(prompt.contains("\"日本語\""));
    }
}
