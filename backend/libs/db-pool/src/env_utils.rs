//! Environment variable parsing helpers shared by every service's `Config::from_env`.

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when it is
/// missing or does not parse.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, `None` if missing or invalid
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse a required environment variable
pub fn parse_env_required<T: FromStr>(key: &str) -> Result<T, String> {
    std::env::var(key)
        .map_err(|_| format!("Environment variable {} not found", key))?
        .trim()
        .parse()
        .map_err(|_| format!("Failed to parse environment variable {}", key))
}

/// Boolean flag: `1`/`true`/`yes`/`on` (any case) are true, `0`/`false`/`no`/`off` false.
pub fn parse_env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_with_default() {
        let result: u32 = parse_env_with_default("AGORA_NONEXISTENT_VAR", 42);
        assert_eq!(result, 42);

        std::env::set_var("AGORA_TEST_PORT", "8080");
        let result: u16 = parse_env_with_default("AGORA_TEST_PORT", 3000);
        assert_eq!(result, 8080);
        std::env::remove_var("AGORA_TEST_PORT");
    }

    #[test]
    fn test_parse_env_with_default_ignores_garbage() {
        std::env::set_var("AGORA_TEST_GARBAGE", "not-a-number");
        let result: u64 = parse_env_with_default("AGORA_TEST_GARBAGE", 7);
        assert_eq!(result, 7);
        std::env::remove_var("AGORA_TEST_GARBAGE");
    }

    #[test]
    fn test_parse_env_optional() {
        assert_eq!(parse_env_optional::<u32>("AGORA_NONEXISTENT_VAR"), None);

        std::env::set_var("AGORA_TEST_OPT", " 123 ");
        assert_eq!(parse_env_optional::<u32>("AGORA_TEST_OPT"), Some(123));
        std::env::remove_var("AGORA_TEST_OPT");
    }

    #[test]
    fn test_parse_env_required() {
        assert!(parse_env_required::<u32>("AGORA_NONEXISTENT_VAR").is_err());

        std::env::set_var("AGORA_TEST_REQ", "456");
        assert_eq!(parse_env_required::<u32>("AGORA_TEST_REQ"), Ok(456));
        std::env::remove_var("AGORA_TEST_REQ");
    }

    #[test]
    fn test_parse_env_flag() {
        assert!(parse_env_flag("AGORA_NONEXISTENT_FLAG", true));

        std::env::set_var("AGORA_TEST_FLAG", "FALSE");
        assert!(!parse_env_flag("AGORA_TEST_FLAG", true));
        std::env::set_var("AGORA_TEST_FLAG", "on");
        assert!(parse_env_flag("AGORA_TEST_FLAG", false));
        std::env::set_var("AGORA_TEST_FLAG", "maybe");
        assert!(!parse_env_flag("AGORA_TEST_FLAG", false));
        std::env::remove_var("AGORA_TEST_FLAG");
    }
}
