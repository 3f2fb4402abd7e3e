//! Polishing prompt for dictated text

use sotto_core::{Language, APPLICATION_NAME};

/// Context used when none is configured
pub const DEFAULT_CONTEXT: &str =
    "This is the raw transcription text captured from a voice dictation application on a Linux desktop.";

/// Terms checked for spelling when no vocabulary is configured
pub fn default_vocabulary() -> Vec<String> {
    vec![APPLICATION_NAME.to_string(), "Linux".to_string(), "GNOME".to_string()]
}

/// Build the copy-editing prompt for a raw transcription.
///
/// A blank `context` or empty `vocabulary` falls back to the defaults.
pub fn build_polishing_prompt(
    input: &str,
    language: &Language,
    context: &str,
    vocabulary: &[String],
) -> String {
    let context = if context.trim().is_empty() {
        DEFAULT_CONTEXT
    } else {
        context
    };
    let vocabulary = if vocabulary.is_empty() {
        default_vocabulary().join(", ")
    } else {
        vocabulary.join(", ")
    };

    format!(
        r#"# Goal
You are an expert copy editor.
Your goal is to review the following INPUT transcription to improve its quality and readability.

## Instructions
- Fix any grammar and spelling errors.
- Add proper capitalization.
- Add any necessary punctuation such as periods and commas.
- Keep punctuation simple: avoid dashes and semicolons.

## Context
{context}

## Vocabulary
Make sure that the following terms are spelled correctly: {vocabulary}.

## OUTPUT format
- Return only the corrected transcription.
- Do not add commentary, answers, or timestamps.
- Preserve the same language as the INPUT.

## Examples

INPUT: what time is it
OUTPUT: What time is it?

INPUT: well update to the the L T S version. of the linux distribution right away.
OUTPUT: We'll update to the LTS version of the Linux distribution right away.

INPUT: Open the mail app send an email to John at example dot com and close it
OUTPUT: Open the mail app, send an email to john@example.com, and close it.

# Transcription
LANGUAGE: {language}
INPUT: {input}
OUTPUT: "#,
        context = context,
        vocabulary = vocabulary,
        language = language.name,
        input = input.trim(),
    )
}
