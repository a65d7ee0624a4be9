// settingsync/src/sync/logic.rs
use anyhow::{Context, Result};
use std::fmt;

use super::plan::{LocalAction, SyncPlan};
use super::prompt::Confirm;
use crate::remote::{RecordStore, StoreResponse};

pub const REMOVAL_QUESTION: &str = "Are you sure you wish to remove the above records?";

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Updates or removals that were declined.
    pub skipped: usize,
    pub deleted: usize,
    /// Mutations the server answered with something other than 200/201.
    pub failed: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} up to date, {} skipped, {} deleted, {} failed",
            self.created, self.updated, self.unchanged, self.skipped, self.deleted, self.failed
        )
    }
}

/// Prints a failed mutation and records it. The run carries on.
fn report_failure(report: &mut SyncReport, label: &str, id: &str, response: &StoreResponse) {
    println!("❌ {}! {} (status {})", label, id, response.status);
    println!("{}", response.body);
    tracing::warn!(id, status = response.status, "{}", label);
    report.failed += 1;
}

/// Applies `plan` against `store`, one request at a time.
///
/// Creates go through unconditionally. Each update needs its own approval
/// from `confirm`; removals are approved once, as a batch. With `dry_run`
/// nothing is sent and nobody is asked.
pub async fn apply_plan<S, C>(
    store: &S,
    plan: &SyncPlan,
    confirm: &mut C,
    dry_run: bool,
) -> Result<SyncReport>
where
    S: RecordStore,
    C: Confirm,
{
    let mut report = SyncReport::default();

    for planned in &plan.local {
        println!("{}", planned.id);

        match &planned.action {
            LocalAction::UpToDate => {
                println!("Up to date");
                report.unchanged += 1;
            }
            LocalAction::Create if dry_run => println!("Would create {}", planned.id),
            LocalAction::Create => {
                let response = store
                    .create(&planned.record)
                    .await
                    .with_context(|| format!("Failed to create record {}", planned.id))?;
                if response.is_success() {
                    println!("✓ Created {}", planned.id);
                    report.created += 1;
                } else {
                    report_failure(&mut report, "BAD UPLOAD", &planned.id, &response);
                }
            }
            LocalAction::Update { remote_id } if dry_run => {
                println!("Would update {} (remote id {})", planned.id, remote_id)
            }
            LocalAction::Update { remote_id } => {
                if !confirm.confirm(&format!("Upload changes to {}", planned.id))? {
                    report.skipped += 1;
                    continue;
                }
                let response = store
                    .update(remote_id, &planned.record)
                    .await
                    .with_context(|| format!("Failed to update record {}", planned.id))?;
                println!("{}", response.status);
                if response.is_success() {
                    report.updated += 1;
                } else {
                    report_failure(&mut report, "BAD UPDATE", &planned.id, &response);
                }
            }
        }
    }

    if plan.removals.is_empty() {
        return Ok(report);
    }

    println!("\nRecords to Remove:\n");
    for removal in &plan.removals {
        println!("{}", removal.id);
    }

    if dry_run {
        println!("Dry run: {} record(s) would be removed.", plan.removals.len());
        return Ok(report);
    }

    if !confirm.confirm(REMOVAL_QUESTION)? {
        report.skipped += plan.removals.len();
        return Ok(report);
    }

    for removal in &plan.removals {
        println!("{}", removal.id);
        let response = store
            .delete(&removal.remote_id)
            .await
            .with_context(|| format!("Failed to delete record {}", removal.id))?;
        println!("{}", response.status);
        if response.is_success() {
            report.deleted += 1;
        } else {
            report_failure(&mut report, "BAD DELETE", &removal.id, &response);
        }
    }

    Ok(report)
}
