use std::str::FromStr;

use thiserror::Error;

/// An environment variable is set but its value cannot be parsed.
#[derive(Debug, Error)]
#[error("Invalid value for environment variable {name}: {value:?}")]
pub struct InvalidEnvVarError {
    pub name: String,
    pub value: String,
}

/// Reads an optional override. Unset and blank values both yield `None`.
pub fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads an optional override and parses it into `T`.
pub fn parse_env_override<T: FromStr>(name: &str) -> Result<Option<T>, InvalidEnvVarError> {
    match env_override(name) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|_| InvalidEnvVarError {
            name: name.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // SAFETY (for the unsafe env calls below): tests touching the process
    // environment are serialized.

    #[test]
    #[serial]
    fn unset_override_is_none() {
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_MISSING") };
        assert_eq!(env_override("SHARED_UTILS_TEST_MISSING"), None);
    }

    #[test]
    #[serial]
    fn blank_override_is_ignored() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_BLANK", "   ") };
        assert_eq!(env_override("SHARED_UTILS_TEST_BLANK"), None);
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_BLANK") };
    }

    #[test]
    #[serial]
    fn parses_numeric_override() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_NUM", " 42 ") };
        let got: Option<u64> = parse_env_override("SHARED_UTILS_TEST_NUM").unwrap();
        assert_eq!(got, Some(42));

        unsafe { std::env::set_var("SHARED_UTILS_TEST_NUM", "forty-two") };
        let err = parse_env_override::<u64>("SHARED_UTILS_TEST_NUM").unwrap_err();
        assert_eq!(err.name, "SHARED_UTILS_TEST_NUM");
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_NUM") };
    }
}
