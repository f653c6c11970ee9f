/// Rough token count used for response accounting.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}
