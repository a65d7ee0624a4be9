// settingsync/src/sync/plan.rs
use std::collections::{HashMap, HashSet};

use crate::errors::{AppError, RecordOrigin, Result};
use crate::records::identifier::{IdStrategy, RecordId};
use crate::records::{Record, RecordCollection, ensure_unique_ids, stripped};

/// What happens to one local record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAction {
    /// Not on the server yet.
    Create,
    /// On the server with different content; `remote_id` is the
    /// server-assigned id the update goes to.
    Update { remote_id: String },
    UpToDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRecord {
    pub id: String,
    /// The local record without its transient fields, as it would be uploaded.
    pub record: Record,
    pub action: LocalAction,
}

/// A remote record that no longer exists locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub id: String,
    pub remote_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    /// One entry per local record, in dump order.
    pub local: Vec<PlannedRecord>,
    /// Remote records without a local counterpart, in server order.
    pub removals: Vec<Removal>,
}

impl SyncPlan {
    fn count(&self, pred: impl Fn(&LocalAction) -> bool) -> usize {
        self.local.iter().filter(|p| pred(&p.action)).count()
    }

    pub fn creates(&self) -> usize {
        self.count(|a| matches!(a, LocalAction::Create))
    }

    pub fn updates(&self) -> usize {
        self.count(|a| matches!(a, LocalAction::Update { .. }))
    }

    pub fn up_to_date(&self) -> usize {
        self.count(|a| matches!(a, LocalAction::UpToDate))
    }

    /// True when applying the plan would not touch the server.
    pub fn is_noop(&self) -> bool {
        self.creates() == 0 && self.updates() == 0 && self.removals.is_empty()
    }
}

/// Diffs the local dump against the remote collection.
///
/// Records are matched by the identifier `strategy` extracts and compared
/// after stripping transient fields from both sides. Duplicate identifiers on
/// either side abort planning, so nothing is sent for an ambiguous dump.
pub fn build_plan(
    local: &RecordCollection,
    remote: &RecordCollection,
    strategy: &IdStrategy,
) -> Result<SyncPlan> {
    ensure_unique_ids(&local.data, strategy, RecordOrigin::Local)?;
    ensure_unique_ids(&remote.data, strategy, RecordOrigin::Remote)?;

    let mut remote_by_id: HashMap<RecordId, &Record> = HashMap::with_capacity(remote.len());
    for record in &remote.data {
        remote_by_id.insert(strategy.identify(record, RecordOrigin::Remote)?, record);
    }

    let mut plan = SyncPlan::default();
    let mut local_ids = HashSet::with_capacity(local.len());

    for record in &local.data {
        let id = strategy.identify(record, RecordOrigin::Local)?;
        let candidate = stripped(record);

        let action = match remote_by_id.get(&id) {
            None => LocalAction::Create,
            Some(existing) if stripped(existing) == candidate => LocalAction::UpToDate,
            Some(existing) => LocalAction::Update {
                remote_id: remote_id(existing, &id)?,
            },
        };

        plan.local.push(PlannedRecord {
            id: id.to_string(),
            record: candidate,
            action,
        });
        local_ids.insert(id);
    }

    for record in &remote.data {
        let id = strategy.identify(record, RecordOrigin::Remote)?;
        if !local_ids.contains(&id) {
            let remote_id = remote_id(record, &id)?;
            plan.removals.push(Removal {
                id: id.to_string(),
                remote_id,
            });
        }
    }

    Ok(plan)
}

fn remote_id(record: &Record, id: &RecordId) -> Result<String> {
    record
        .get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::MissingRemoteId { id: id.to_string() })
}
