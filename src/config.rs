//! Helpers for parsing configuration

use std::env::VarError;

use crate::notification::NoticeType;

/// Get an environment variable with an optional prefix
pub fn prefixed_env_var(prefix: &str, key: &str) -> Result<String, VarError> {
    if prefix.is_empty() {
        std::env::var(key)
    } else {
        std::env::var(format!("{prefix}{key}"))
    }
}

/// Parse an `Option<String>`, returning an error if the value is present and fails to parse to the expected type.
pub fn parse_option<T: std::str::FromStr>(value: Option<String>) -> Result<Option<T>, T::Err> {
    match value {
        Some(v) => Ok(Some(v.parse()?)),
        None => Ok(None),
    }
}

/// Set `dest` to the value of `src`, if src is Some
pub fn merge_option_if_set<T>(dest: &mut Option<T>, src: Option<T>) {
    if src.is_some() {
        *dest = src;
    }
}

/// Settings for notices sent when non-administrators change records.
#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    /// The From address on notice emails
    pub from: Option<String>,
    /// The notice type sent on save. Notices are only sent when this is set.
    pub notice_type: Option<NoticeType>,
    /// Initial value of the `allnoticerecipients` site setting
    pub recipients: Option<String>,
}

impl NotificationConfig {
    /// Read the configuration from `{prefix}EMAIL_FROM`, `{prefix}NOTICE_TYPE`, and
    /// `{prefix}NOTICE_RECIPIENTS`.
    pub fn from_env(prefix: &str) -> Self {
        Self {
            from: prefixed_env_var(prefix, "EMAIL_FROM").ok(),
            notice_type: prefixed_env_var(prefix, "NOTICE_TYPE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(NoticeType::new),
            recipients: prefixed_env_var(prefix, "NOTICE_RECIPIENTS").ok(),
        }
    }

    /// Overlay values from `other` that are set.
    pub fn merge(&mut self, other: NotificationConfig) {
        merge_option_if_set(&mut self.from, other.from);
        merge_option_if_set(&mut self.notice_type, other.notice_type);
        merge_option_if_set(&mut self.recipients, other.recipients);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_option_values() {
        assert_eq!(parse_option::<u16>(None).unwrap(), None);
        assert_eq!(parse_option::<u16>(Some("80".into())).unwrap(), Some(80));
        assert!(parse_option::<u16>(Some("eighty".into())).is_err());
    }

    #[test]
    fn merge_keeps_unset_values() {
        let mut config = NotificationConfig {
            from: Some("site@example.com".into()),
            notice_type: Some(NoticeType::new("photo_saved")),
            recipients: None,
        };

        config.merge(NotificationConfig {
            from: None,
            notice_type: None,
            recipients: Some("admin@example.com".into()),
        });

        assert_eq!(config.from.as_deref(), Some("site@example.com"));
        assert_eq!(config.notice_type.unwrap().as_str(), "photo_saved");
        assert_eq!(config.recipients.as_deref(), Some("admin@example.com"));
    }
}
