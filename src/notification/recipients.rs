use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use error_stack::{Report, ResultExt};
use tracing::instrument;

use super::NotifyError;

/// Read access to site settings, keyed by (scope, scope category, name).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(
        &self,
        scope: &str,
        scope_category: &str,
        name: &str,
    ) -> Result<Option<String>, Report<NotifyError>>;
}

/// A [SettingsStore] that keeps its values in memory.
#[derive(Default)]
pub struct InMemorySettings {
    values: Mutex<HashMap<(String, String, String), String>>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, scope: &str, scope_category: &str, name: &str, value: impl Into<String>) {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(
            (scope.to_string(), scope_category.to_string(), name.to_string()),
            value.into(),
        );
    }
}

#[async_trait]
impl SettingsStore for InMemorySettings {
    async fn get_setting(
        &self,
        scope: &str,
        scope_category: &str,
        name: &str,
    ) -> Result<Option<String>, Report<NotifyError>> {
        let values = self
            .values
            .lock()
            .map_err(|_| Report::new(NotifyError::Settings))?;
        Ok(values
            .get(&(scope.to_string(), scope_category.to_string(), name.to_string()))
            .cloned())
    }
}

/// Look up the addresses configured to receive notices. The setting holds addresses
/// separated by commas or whitespace; duplicates and blanks are dropped.
#[instrument(skip(settings))]
pub async fn get_notice_recipients(
    settings: &dyn SettingsStore,
    scope: &str,
    scope_category: &str,
    name: &str,
) -> Result<Vec<String>, Report<NotifyError>> {
    let value = settings
        .get_setting(scope, scope_category, name)
        .await
        .attach_printable_lazy(|| format!("setting {scope}/{scope_category}/{name}"))?;

    Ok(value.as_deref().map(parse_recipients).unwrap_or_default())
}

fn parse_recipients(value: &str) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::new();
    for address in value
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        if !recipients.iter().any(|r| r == address) {
            recipients.push(address.to_string());
        }
    }
    recipients
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_recipient_list() {
        assert_eq!(
            parse_recipients(" a@example.com,b@example.com \n c@example.com,, a@example.com"),
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
        assert!(parse_recipients(" , ").is_empty());
    }

    #[tokio::test]
    async fn missing_setting_means_no_recipients() {
        let settings = InMemorySettings::new();
        let recipients = get_notice_recipients(&settings, "site", "global", "allnoticerecipients")
            .await
            .unwrap();
        assert!(recipients.is_empty());

        settings.set("site", "global", "allnoticerecipients", "ops@example.com");
        let recipients = get_notice_recipients(&settings, "site", "global", "allnoticerecipients")
            .await
            .unwrap();
        assert_eq!(recipients, vec!["ops@example.com"]);
    }
}
