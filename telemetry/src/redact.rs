/// Characters of a bearer token kept when it appears in logs or responses
pub const TOKEN_PREFIX_LEN: usize = 10;

/// First [`TOKEN_PREFIX_LEN`] characters of `token` followed by `...`.
///
/// Tokens no longer than the prefix are fully masked.
pub fn redact_token(token: &str) -> String {
    match token.char_indices().nth(TOKEN_PREFIX_LEN) {
        Some((end, _)) => format!("{}...", token.get(..end).unwrap_or_default()),
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_token_keeps_prefix() {
        assert_eq!(
            redact_token("eyJhbGciOiJIUzI1NiJ9.payload.sig"),
            "eyJhbGciOi..."
        );
    }

    #[test]
    fn test_redact_short_token() {
        assert_eq!(redact_token("short"), "***");
        assert_eq!(redact_token("0123456789"), "***");
        assert_eq!(redact_token(""), "***");
    }
}
