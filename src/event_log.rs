//! The append-only audit trail of who did what to which record.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_stack::Report;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{event, Level};
use typed_builder::TypedBuilder;

use crate::{
    auth::{Principal, UserId},
    make_object_id,
    requests::RequestContext,
};

make_object_id!(EventLogId, evt);

#[derive(Debug, Error)]
#[error("Failed to write event log")]
pub struct EventLogError;

/// The user an entry is attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub username: String,
}

impl From<&Principal> for UserRef {
    fn from(user: &Principal) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// The record an entry is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRef {
    pub object_type: String,
    pub object_id: String,
    pub object_repr: String,
}

/// One immutable line of the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct EventLogEntry {
    #[builder(default)]
    pub id: EventLogId,
    /// A numeric code identifying the kind of event
    pub event_id: u32,
    /// A sentence describing what happened, including the object and user
    #[builder(setter(into))]
    pub event_data: String,
    #[builder(setter(into))]
    pub description: String,
    #[builder(default, setter(strip_option, into))]
    pub user: Option<UserRef>,
    pub request: RequestContext,
    #[builder(default, setter(strip_option))]
    pub instance: Option<InstanceRef>,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

/// An append-only destination for [EventLogEntry] values.
#[async_trait]
pub trait EventLogSink: Send + Sync {
    /// Append an entry.
    async fn log(&self, entry: EventLogEntry) -> Result<(), Report<EventLogError>>;

    /// All entries, oldest first.
    async fn entries(&self) -> Result<Vec<EventLogEntry>, Report<EventLogError>>;
}

/// An [EventLogSink] that keeps entries in memory.
#[derive(Default)]
pub struct InMemoryEventLog {
    entries: Mutex<Vec<EventLogEntry>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventLogSink for InMemoryEventLog {
    async fn log(&self, entry: EventLogEntry) -> Result<(), Report<EventLogError>> {
        event!(
            Level::INFO,
            event_id = entry.event_id,
            user = entry.user.as_ref().map(|u| u.username.as_str()),
            "{}",
            entry.event_data
        );

        self.entries
            .lock()
            .map_err(|_| Report::new(EventLogError))?
            .push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<EventLogEntry>, Report<EventLogError>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Report::new(EventLogError))?;
        Ok(entries.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn appends_in_order() {
        let log = InMemoryEventLog::new();
        for event_id in [1, 2, 3] {
            log.log(
                EventLogEntry::builder()
                    .event_id(event_id)
                    .event_data(format!("event {event_id}"))
                    .description("test")
                    .request(RequestContext::default())
                    .build(),
            )
            .await
            .unwrap();
        }

        let entries = log.entries().await.unwrap();
        let ids = entries.iter().map(|e| e.event_id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(entries[0].user.is_none());
        assert!(entries[0].instance.is_none());
    }
}
