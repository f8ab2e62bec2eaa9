//! Builds the styled prompt sent to the image generation provider.

const MAX_SUBJECT_CHARS: usize = 200;

const PROMPT_PREFIX: &str = "a simple, colourful cartoon educational illustration of";
const PROMPT_SUFFIX: &str = "- clean vector style, friendly learning visual, \
                             white background, no text, no labels, no photorealism";

/// Turn a card's raw back text into an illustration prompt.
///
/// Deterministic: trims, collapses whitespace runs, truncates to the first
/// 200 characters (appending an ellipsis), lower-cases, then wraps the
/// subject in fixed style directives. Any input, including an empty string,
/// yields a well-formed prompt.
pub fn build_image_prompt(back_text: &str) -> String {
    let cleaned = back_text.split_whitespace().collect::<Vec<_>>().join(" ");

    let subject = if cleaned.chars().count() > MAX_SUBJECT_CHARS {
        let mut truncated: String = cleaned.chars().take(MAX_SUBJECT_CHARS).collect();
        truncated.push_str("...");
        truncated
    } else {
        cleaned
    };

    format!("{PROMPT_PREFIX} {} {PROMPT_SUFFIX}", subject.to_lowercase())
}
