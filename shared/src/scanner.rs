//! Token scanner

/// Split a message into upper-cased, whitespace separated tokens, in order.
pub fn scan(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_uppercase).collect()
}
