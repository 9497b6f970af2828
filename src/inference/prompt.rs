//! Prompt templates with named `{variable}` placeholders.

use std::collections::BTreeMap;

use super::InferenceError;

/// Variables substituted into a [`PromptTemplate`].
pub type PromptVariables = BTreeMap<&'static str, String>;

/// A prompt with `{name}` placeholders for each declared input variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Placeholder names the template expects.
    pub input_variables: &'static [&'static str],
    /// Template text.
    pub template: &'static str,
}

/// Question answering over the loaded corpus.
pub const QA_TEMPLATE: PromptTemplate = PromptTemplate {
    input_variables: &["context", "question"],
    template: "Context: {context}\n\nQuestion: {question}\nAnswer:",
};

/// Short summary of the loaded corpus.
pub const SUMMARIZE_TEMPLATE: PromptTemplate = PromptTemplate {
    input_variables: &["text"],
    template: "Summarize the following text in 2-3 lines:\n\n{text}",
};

impl PromptTemplate {
    /// Substitute every declared variable; a missing variable is an error.
    ///
    /// Substitution happens in a single left-to-right pass, so braces inside variable values
    /// are never re-expanded.
    pub fn render(&self, variables: &PromptVariables) -> Result<String, InferenceError> {
        for name in self.input_variables {
            if !variables.contains_key(name) {
                return Err(InferenceError::MissingVariable((*name).to_string()));
            }
        }

        let mut rendered = String::with_capacity(self.template.len());
        let mut rest = self.template;
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}').map(|close| (&after[..close], close)) {
                Some((name, close)) if self.input_variables.contains(&name) => {
                    rendered.push_str(&variables[name]);
                    rest = &after[close + 1..];
                }
                _ => {
                    rendered.push('{');
                    rest = after;
                }
            }
        }
        rendered.push_str(rest);
        Ok(rendered)
    }
}
