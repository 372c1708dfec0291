/// Compares the handle read off the screenshot with the account the caller
/// expects. Returns a mismatch message, or `None` when they agree or when no
/// handle was found (absence cannot contradict the expected account).
pub fn check_identity(found: Option<&str>, expected: &str) -> Option<String> {
    let found = found?;
    let expected = normalize(expected);
    if normalize(found) == expected {
        None
    } else {
        Some(format!(
            "Found @{} in image, but your linked account is @{}",
            found, expected
        ))
    }
}

fn normalize(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_handles_case_insensitive() {
        assert_eq!(check_identity(Some("Alice"), "alice"), None);
        assert_eq!(check_identity(Some("alice"), "@ALICE "), None);
    }

    #[test]
    fn test_absent_handle_is_not_a_mismatch() {
        assert_eq!(check_identity(None, "alice"), None);
    }

    #[test]
    fn test_mismatch_message() {
        assert_eq!(
            check_identity(Some("alice"), "Bob").as_deref(),
            Some("Found @alice in image, but your linked account is @bob")
        );
    }
}
