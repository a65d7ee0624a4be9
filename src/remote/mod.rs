// settingsync/src/remote/mod.rs
pub(crate) mod http_client;

use anyhow::Result;

use crate::records::{Record, RecordCollection};

/// Status and body of a mutating call against the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    pub status: u16,
    pub body: String,
}

impl StoreResponse {
    /// Only 200 and 201 count as success; anything else is reported.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}

/// The remote collection the driver reconciles against.
///
/// `Err` means the request itself could not be carried out (network failure)
/// and aborts the run. A non-success status on a mutation comes back as an
/// `Ok(StoreResponse)` so the driver can report it and move on.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Fetches every record of the collection. A non-success status is an error.
    async fn list(&self) -> Result<RecordCollection>;

    async fn create(&self, record: &Record) -> Result<StoreResponse>;

    async fn update(&self, remote_id: &str, record: &Record) -> Result<StoreResponse>;

    async fn delete(&self, remote_id: &str) -> Result<StoreResponse>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Create(Record),
        Update(String, Record),
        Delete(String),
    }

    /// In-memory store that records every mutation it receives.
    #[derive(Default)]
    pub struct FakeStore {
        pub remote: RecordCollection,
        /// Status to answer for a given remote id (or, for creates, the
        /// record identifier stored under `telemetryId`/`identifier`).
        pub statuses: HashMap<String, u16>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl FakeStore {
        pub fn with_remote(remote: RecordCollection) -> Self {
            FakeStore {
                remote,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, key: Option<&str>, call: Call) -> StoreResponse {
            self.calls.lock().unwrap().push(call);
            let status = key
                .and_then(|k| self.statuses.get(k).copied())
                .unwrap_or(200);
            StoreResponse {
                status,
                body: format!("{{\"status\": {status}}}"),
            }
        }
    }

    impl RecordStore for FakeStore {
        async fn list(&self) -> Result<RecordCollection> {
            Ok(self.remote.clone())
        }

        async fn create(&self, record: &Record) -> Result<StoreResponse> {
            let key = record
                .get("telemetryId")
                .or_else(|| record.get("identifier"))
                .and_then(|v| v.as_str());
            Ok(self.answer(key, Call::Create(record.clone())))
        }

        async fn update(&self, remote_id: &str, record: &Record) -> Result<StoreResponse> {
            Ok(self.answer(
                Some(remote_id),
                Call::Update(remote_id.to_string(), record.clone()),
            ))
        }

        async fn delete(&self, remote_id: &str) -> Result<StoreResponse> {
            Ok(self.answer(Some(remote_id), Call::Delete(remote_id.to_string())))
        }
    }
}
