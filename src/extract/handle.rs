/// Punctuation OCR tends to attach to either end of a handle.
const HANDLE_TRIM: &[char] = &['.', ',', ';', ':', '!', ')', ']', '}', '('];

/// Returns the first `@handle` token in scan order, without the `@` and any
/// stray punctuation. Tokens of three characters or fewer (including the `@`)
/// are ignored as noise.
pub fn find_handle<'a>(texts: impl IntoIterator<Item = &'a str>) -> Option<String> {
    texts
        .into_iter()
        .flat_map(str::split_whitespace)
        .filter(|token| token.starts_with('@') && token.chars().count() > 3)
        .map(|token| token.trim_start_matches('@').trim_matches(HANDLE_TRIM).to_string())
        .find(|handle| !handle.is_empty())
}
