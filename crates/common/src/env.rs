use std::time::Duration;

/// Environment variable with a fallback, treating empty values as unset.
pub fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Parses an environment variable as a `humantime` duration (`30s`, `5m`).
/// Returns `None` when unset; logs nothing, callers decide how loud a parse
/// failure should be via [`parse_duration`].
pub fn env_duration(name: &str) -> Option<Result<Duration, humantime::DurationError>> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Some(humantime::parse_duration(&v)),
        _ => None,
    }
}

/// Parses a duration string like `30s` or `5m`.
pub fn parse_duration(value: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(value)
}

/// Formats a duration back into the `humantime` form (`5m`, `30s`).
pub fn format_duration(value: Duration) -> String {
    humantime::format_duration(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_returns_default_when_unset() {
        assert_eq!(env_or("AF_TEST_UNSET_VAR", "fallback"), "fallback");
    }

    #[test]
    fn env_or_returns_value_when_set() {
        std::env::set_var("AF_TEST_SET_VAR", "value");
        assert_eq!(env_or("AF_TEST_SET_VAR", "fallback"), "value");
        std::env::remove_var("AF_TEST_SET_VAR");
    }

    #[test]
    fn parse_duration_accepts_go_style_forms() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("not-a-duration").is_err());
    }

    #[test]
    fn format_round_trips() {
        assert_eq!(format_duration(Duration::from_secs(300)), "5m");
    }
}
