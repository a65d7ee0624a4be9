// settingsync/src/sync/mod.rs
pub(crate) mod logic;
pub(crate) mod plan;
pub(crate) mod prompt;

use anyhow::{Context, Result};

use crate::config::SyncConfig;
use crate::records::RecordCollection;
use crate::records::identifier::IdStrategy;
use crate::remote::RecordStore;
use logic::SyncReport;
use prompt::Confirm;

/// Public entry point for the sync process.
/// Loads the local dump, fetches the remote collection, plans the diff and
/// applies it.
pub async fn run_sync_flow<S, C>(config: &SyncConfig, store: &S, confirm: &mut C) -> Result<SyncReport>
where
    S: RecordStore,
    C: Confirm,
{
    println!(
        "⚙️ Syncing collection '{}' into bucket '{}' on {} ({})",
        config.collection,
        config.bucket,
        config.server.name(),
        config.records_url
    );

    let local = RecordCollection::load_from_file(&config.dump_path)?;
    println!("📂 Loaded {} local records from {}", local.len(), config.dump_path.display());
    if local.is_empty() {
        println!("⚠️ The dump is empty: every remote record will be listed for removal.");
    }

    let remote = store
        .list()
        .await
        .with_context(|| format!("Failed to fetch remote records for {}", config.collection))?;
    println!("🔍 Found {} remote records", remote.len());

    let strategy = IdStrategy::for_collection(&config.collection);
    tracing::debug!(collection = %config.collection, ?strategy, "identifier strategy selected");

    let plan = plan::build_plan(&local, &remote, &strategy)
        .with_context(|| format!("Failed to compare records for {}", config.collection))?;

    println!(
        "Plan: {} new, {} changed, {} up to date, {} to remove",
        plan.creates(),
        plan.updates(),
        plan.up_to_date(),
        plan.removals.len()
    );
    if plan.is_noop() {
        println!("✓ Remote collection is already up to date.");
    }

    logic::apply_plan(store, &plan, confirm, config.dry_run).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvOverrides, RawJsonConfig, RunOptions, Server};
    use crate::errors::AppError;
    use crate::records::Record;
    use crate::remote::fake::{Call, FakeStore};
    use super::logic::REMOVAL_QUESTION;
    use super::prompt::scripted::ScriptedConfirm;
    use serde_json::{Value, json};
    use std::fs;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    /// Writes `dump` as `<collection>.json` into a fresh directory and
    /// resolves a config pointing at it.
    fn config_with_dump(
        collection: &str,
        dump: &Value,
        dry_run: bool,
    ) -> anyhow::Result<(tempfile::TempDir, SyncConfig)> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(format!("{}.json", collection)), dump.to_string())?;
        let options = RunOptions {
            dumps_dir: Some(dir.path().to_path_buf()),
            dry_run,
            ..Default::default()
        };
        let config = SyncConfig::resolve(
            Server::Dev,
            collection,
            &options,
            &EnvOverrides::default(),
            &RawJsonConfig::default(),
        )?;
        Ok((dir, config))
    }

    fn scenario_remote() -> RecordCollection {
        serde_json::from_value(json!({"data": [
            {"id": "id-b", "last_modified": 100, "telemetryId": "B", "weight": 1},
            {"id": "id-c", "last_modified": 101, "schema": 7, "telemetryId": "C", "weight": 1},
            {"id": "id-d", "last_modified": 102, "telemetryId": "D", "weight": 1}
        ]}))
        .unwrap()
    }

    fn scenario_dump() -> Value {
        json!({"data": [
            {"telemetryId": "A", "weight": 1},
            {"telemetryId": "B", "weight": 2},
            {"telemetryId": "C", "weight": 1}
        ]})
    }

    #[tokio::test]
    async fn test_scenario_all_approved() -> anyhow::Result<()> {
        let (_dir, config) = config_with_dump("search-telemetry", &scenario_dump(), false)?;
        let store = FakeStore::with_remote(scenario_remote());
        let mut confirm = ScriptedConfirm::new([true, true]);

        let report = run_sync_flow(&config, &store, &mut confirm).await?;

        assert_eq!(confirm.questions, vec!["Upload changes to B", REMOVAL_QUESTION]);
        assert_eq!(
            store.calls(),
            vec![
                Call::Create(record(json!({"telemetryId": "A", "weight": 1}))),
                Call::Update("id-b".to_string(), record(json!({"telemetryId": "B", "weight": 2}))),
                Call::Delete("id-d".to_string()),
            ]
        );
        assert_eq!(
            report,
            SyncReport {
                created: 1,
                updated: 1,
                unchanged: 1,
                skipped: 0,
                deleted: 1,
                failed: 0,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_scenario_all_declined_only_creates() -> anyhow::Result<()> {
        let (_dir, config) = config_with_dump("search-telemetry", &scenario_dump(), false)?;
        let store = FakeStore::with_remote(scenario_remote());
        let mut confirm = ScriptedConfirm::new([false, false]);

        let report = run_sync_flow(&config, &store, &mut confirm).await?;

        assert_eq!(
            store.calls(),
            vec![Call::Create(record(json!({"telemetryId": "A", "weight": 1})))]
        );
        assert_eq!(report.skipped, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_scenario_dry_run() -> anyhow::Result<()> {
        let (_dir, config) = config_with_dump("search-telemetry", &scenario_dump(), true)?;
        let store = FakeStore::with_remote(scenario_remote());
        let mut confirm = ScriptedConfirm::default();

        run_sync_flow(&config, &store, &mut confirm).await?;

        assert!(store.calls().is_empty());
        assert!(confirm.questions.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_identifiers_abort_before_any_request() -> anyhow::Result<()> {
        let dump = json!({"data": [
            {"webExtension": {"id": "a@search.mozilla.org"}, "v": 1},
            {"webExtension": {"id": "a@search.mozilla.org"}, "v": 2}
        ]});
        let (_dir, config) = config_with_dump("search-config", &dump, false)?;
        let store = FakeStore::default();
        let mut confirm = ScriptedConfirm::default();

        let err = run_sync_flow(&config, &store, &mut confirm).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::DuplicateIdentifier { .. })
        ));
        assert!(store.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_dump_is_fatal() -> anyhow::Result<()> {
        let (_dir, mut config) = config_with_dump("search-telemetry", &scenario_dump(), false)?;
        config.dump_path = config.dump_path.with_file_name("does-not-exist.json");
        let store = FakeStore::default();
        let mut confirm = ScriptedConfirm::default();

        assert!(run_sync_flow(&config, &store, &mut confirm).await.is_err());
        assert!(store.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_dump_is_fatal() -> anyhow::Result<()> {
        let (_dir, config) = config_with_dump("search-telemetry", &json!([1, 2, 3]), false)?;
        let store = FakeStore::default();
        let mut confirm = ScriptedConfirm::default();

        assert!(run_sync_flow(&config, &store, &mut confirm).await.is_err());
        Ok(())
    }
}
