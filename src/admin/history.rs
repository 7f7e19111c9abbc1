//! The admin site's own record of additions, changes, and deletions, written before any
//! model-specific audit entries.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AdminModel, AdminRequest};
use crate::{auth::UserId, make_object_id, Error};

make_object_id!(AdminLogEntryId, ahl);

const MAX_REPR_LEN: usize = 200;

#[derive(Debug, Error)]
#[error("Failed to write admin history")]
pub struct AdminHistoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ActionFlag {
    Addition = 1,
    Change = 2,
    Deletion = 3,
}

impl From<ActionFlag> for u8 {
    fn from(flag: ActionFlag) -> u8 {
        flag as u8
    }
}

impl TryFrom<u8> for ActionFlag {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ActionFlag::Addition),
            2 => Ok(ActionFlag::Change),
            3 => Ok(ActionFlag::Deletion),
            _ => Err(format!("unknown action flag {value}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLogEntry {
    pub id: AdminLogEntryId,
    pub action_time: DateTime<Utc>,
    pub user_id: UserId,
    pub object_type: String,
    pub object_id: String,
    pub object_repr: String,
    pub action_flag: ActionFlag,
    pub change_message: String,
}

#[async_trait]
pub trait AdminHistory: Send + Sync {
    async fn record(&self, entry: AdminLogEntry) -> Result<(), Report<AdminHistoryError>>;

    async fn entries(&self) -> Result<Vec<AdminLogEntry>, Report<AdminHistoryError>>;
}

#[derive(Default)]
pub struct InMemoryAdminHistory {
    entries: Mutex<Vec<AdminLogEntry>>,
}

impl InMemoryAdminHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminHistory for InMemoryAdminHistory {
    async fn record(&self, entry: AdminLogEntry) -> Result<(), Report<AdminHistoryError>> {
        self.entries
            .lock()
            .map_err(|_| Report::new(AdminHistoryError))?
            .push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<AdminLogEntry>, Report<AdminHistoryError>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Report::new(AdminHistoryError))?;
        Ok(entries.clone())
    }
}

async fn record<M: AdminModel>(
    history: &dyn AdminHistory,
    request: &AdminRequest,
    object: &M,
    object_repr: &str,
    action_flag: ActionFlag,
    change_message: &str,
) -> Result<(), Report<Error>> {
    let entry = AdminLogEntry {
        id: AdminLogEntryId::new(),
        action_time: Utc::now(),
        user_id: request.user.id,
        object_type: M::OBJECT_NAME.to_string(),
        object_id: object.pk().to_string(),
        object_repr: object_repr.chars().take(MAX_REPR_LEN).collect(),
        action_flag,
        change_message: change_message.to_string(),
    };

    history
        .record(entry)
        .await
        .change_context(Error::AdminHistory)
}

/// Record that `object` was added.
pub async fn log_addition<M: AdminModel>(
    history: &dyn AdminHistory,
    request: &AdminRequest,
    object: &M,
) -> Result<(), Report<Error>> {
    record(
        history,
        request,
        object,
        &object.object_repr(),
        ActionFlag::Addition,
        "",
    )
    .await
}

/// Record that `object` was changed, with a description of the changed fields.
pub async fn log_change<M: AdminModel>(
    history: &dyn AdminHistory,
    request: &AdminRequest,
    object: &M,
    message: &str,
) -> Result<(), Report<Error>> {
    record(
        history,
        request,
        object,
        &object.object_repr(),
        ActionFlag::Change,
        message,
    )
    .await
}

/// Record that `object` was deleted.
pub async fn log_deletion<M: AdminModel>(
    history: &dyn AdminHistory,
    request: &AdminRequest,
    object: &M,
    object_repr: &str,
) -> Result<(), Report<Error>> {
    record(
        history,
        request,
        object,
        object_repr,
        ActionFlag::Deletion,
        "",
    )
    .await
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn action_flags_serialize_as_numbers() {
        assert_eq!(serde_json::to_string(&ActionFlag::Change).unwrap(), "2");
        let flag: ActionFlag = serde_json::from_str("3").unwrap();
        assert_eq!(flag, ActionFlag::Deletion);
        assert!(serde_json::from_str::<ActionFlag>("9").is_err());
    }
}
