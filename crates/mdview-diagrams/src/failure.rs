//! Human-readable messages for failed renders.

/// Prefix the DevTools protocol adds to exceptions raised in page scripts.
const EVALUATION_MARKER: &str = "Evaluation failed:";

/// Build the error text shown in place of a diagram that failed to render.
///
/// Stack-frame lines (`   at fn (file:line:col)`) are dropped. When nothing
/// useful is left, a generic message with the diagram source is used instead.
#[must_use]
pub(crate) fn error_text(message: Option<&str>, source: &str) -> String {
    let cleaned = message.map(clean_message).unwrap_or_default();
    if cleaned.is_empty() {
        format!("Unknown error occurs during rendering diagram: \n{source}")
    } else {
        cleaned
    }
}

fn clean_message(message: &str) -> String {
    let message = message.replacen(EVALUATION_MARKER, "", 1);
    message
        .lines()
        .filter(|line| !is_stack_frame(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

fn is_stack_frame(line: &str) -> bool {
    line.trim_start()
        .strip_prefix("at")
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}
