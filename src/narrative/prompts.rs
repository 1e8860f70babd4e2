//! Prompt templates for the two completion stages.
//!
//! Both renderers are pure: identical inputs always give identical text, so
//! prompt traces can be compared byte for byte.

use std::path::Path;

use crate::git::accessor::FileContent;

/// Persona for the comparison call.
pub const COMPARISON_ROLE: &str = "a project manager";

/// Persona for the refinement call.
pub const REFINEMENT_ROLE: &str = "a machine-learning software engineer";

/// Instructions preceding the before/after content.
const COMPARISON_INSTRUCTIONS: &str = "Those are the changes of a file {file_name} in my project \
(before and after). What could be the reason those changes were made? Use a single listing with \
possible reasons in your answer without any other paragraphs. Focus on the reasons of the changes \
and not on the changes themselves. Keep it short.";

/// Instructions preceding the comparison answer.
// Keep "their own work" and the space after "cause."; the golden snapshot pins this wording.
const REFINEMENT_INSTRUCTIONS: &str = "Reformulate the following so that it doesn't seem as if \
the writer comments on someone else's work but instead comments on their own work (and of course \
knows why they did what they did). For example, 'suggests' or 'may have been' is a bad \
formulation for my cause. No need for full sentences and make it so I can copy paste it.";

/// Renders the comparison prompt for one changed file.
///
/// Only the final path component is named in the instructions; absent
/// content is rendered as the fixed placeholder sentence.
pub fn comparison_prompt(path: &str, before: &FileContent, after: &FileContent) -> String {
    let file_name = Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |name| name.to_string_lossy().into_owned());
    let instructions = COMPARISON_INSTRUCTIONS.replace("{file_name}", &file_name);

    format!(
        "{instructions}\n\n\nBEFORE CHANGES:\n{}\n\n\nAFTER CHANGES:\n{}",
        before.as_prompt_text(),
        after.as_prompt_text()
    )
}

/// Renders the refinement prompt from the raw comparison answer.
pub fn refinement_prompt(prior_answer: &str) -> String {
    format!("{REFINEMENT_INSTRUCTIONS}\n\n{prior_answer}")
}
