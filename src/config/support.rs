use crate::config::helpers::parse_limit_env;
use crate::error::ConfigError;
use crate::settings::Settings;

const MAX_LIMIT: i64 = 1000;

/// Paging limits for the support queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportConfig {
    /// Listing page length when the caller sends none.
    pub page_length: i64,
    pub comments_per_page: i64,
    pub recent_limit: i64,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            page_length: 10,
            comments_per_page: 50,
            recent_limit: 10,
        }
    }
}

impl SupportConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            page_length: parse_limit_env(
                "SUPPORT_PAGE_LENGTH",
                settings.support.page_length,
                MAX_LIMIT,
            )?,
            comments_per_page: parse_limit_env(
                "SUPPORT_COMMENTS_PER_PAGE",
                settings.support.comments_per_page,
                MAX_LIMIT,
            )?,
            recent_limit: parse_limit_env(
                "SUPPORT_RECENT_LIMIT",
                settings.support.recent_limit,
                MAX_LIMIT,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_resolve_to_defaults() {
        let config = SupportConfig::resolve(&Settings::default()).expect("support config");
        assert_eq!(config, SupportConfig::default());
    }

    #[test]
    fn out_of_range_setting_is_rejected() {
        let mut settings = Settings::default();
        settings.support.recent_limit = 5000;
        let err = SupportConfig::resolve(&settings).expect_err("must reject");
        assert!(err.to_string().contains("SUPPORT_RECENT_LIMIT"), "unexpected: {err}");
    }
}
