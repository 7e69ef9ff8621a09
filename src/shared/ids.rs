/// Record and provider identifiers are used as CLI arguments and JSON keys, so
/// they are restricted to a shell-friendly alphabet.
pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
    {
        return Ok(());
    }
    Err(format!(
        "{kind} `{value}` must use only ASCII letters, digits, '-', '_' or '.'"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_seed_style_identifiers() {
        assert!(validate_identifier_value("story id", "website-builder").is_ok());
        assert!(validate_identifier_value("agent name", "my_chat.v2").is_ok());
    }

    #[test]
    fn rejects_empty_and_spaced_identifiers() {
        assert_eq!(
            validate_identifier_value("story id", "").unwrap_err(),
            "story id must be non-empty"
        );
        assert!(validate_identifier_value("agent name", "my chat").is_err());
    }
}
