use std::str::FromStr;

use crate::error::ConfigError;

/// Read an environment variable, treating empty values as unset.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!("failed to read {key}: {e}"))),
    }
}

pub(crate) fn parse_string_env(key: &str, default: String) -> Result<String, ConfigError> {
    Ok(optional_env(key)?.unwrap_or(default))
}

pub(crate) fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key)? {
        Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}' is not valid: {e}"),
        }),
        None => Ok(default),
    }
}

/// Parse a positive limit and reject values outside `1..=max`.
pub(crate) fn parse_limit_env(key: &str, default: i64, max: i64) -> Result<i64, ConfigError> {
    let value = parse_optional_env(key, default)?;
    if !(1..=max).contains(&value) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("must be between 1 and {max}, got {value}"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_uses_default() {
        let value = parse_limit_env("SUPPORTDESK_TEST_UNSET_LIMIT", 50, 1000).expect("default");
        assert_eq!(value, 50);
    }

    #[test]
    fn default_outside_range_is_rejected() {
        let err = parse_limit_env("SUPPORTDESK_TEST_UNSET_LIMIT_2", 0, 1000)
            .expect_err("zero must be rejected");
        let ConfigError::InvalidValue { key, message } = err else {
            panic!("expected InvalidValue");
        };
        assert_eq!(key, "SUPPORTDESK_TEST_UNSET_LIMIT_2");
        assert!(message.contains("between 1 and 1000"), "unexpected message: {message}");
    }
}
