//! Reconciliation Engine Tests
//!
//! End-to-end runs against the in-memory store covering:
//! - Classification: all-new batches, all-existing batches
//! - Idempotence across consecutive runs
//! - Duplicate natural keys within one batch
//! - Partial failure and per-record error reporting
//! - Store outage semantics (fail fast vs. run-to-completion)
//! - Linking records across entity types (contacts to accounts)

use std::sync::Arc;

use upsync_engine::{
    KeySpec, ReconcileConfig, ReconcileEngine, ReconcileError, RecordOutcome,
};
use upsync_store::{FieldSet, MemoryStore, Record, RecordId, RecordStore};

fn engine_for(store: &Arc<MemoryStore>) -> ReconcileEngine<MemoryStore> {
    ReconcileEngine::new(
        Arc::clone(store),
        ReconcileConfig::new(KeySpec::field("Name")),
    )
}

fn account(name: &str) -> Record {
    Record::new(FieldSet::new().with("Name", name))
}

fn no_fields(_: &Record, _: &RecordId) -> FieldSet {
    FieldSet::new()
}

fn link_account(_: &Record, target: &RecordId) -> FieldSet {
    FieldSet::new().with("AccountId", target)
}

async fn seed(store: &MemoryStore, entity: &str, records: Vec<Record>) -> Vec<RecordId> {
    store
        .batch_create(entity, records)
        .await
        .expect("seed create")
        .into_iter()
        .map(|r| r.expect("seed record accepted"))
        .collect()
}

#[tokio::test]
async fn all_new_batch_creates_one_record_per_input() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_for(&store);

    let report = engine
        .reconcile(
            "account",
            vec![account("Alpha"), account("Bravo"), account("Charlie")],
            &no_fields,
        )
        .await
        .unwrap();

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.created, 3);
    assert_eq!(report.summary.failed, 0);
    assert!(report.result.is_fully_applied());
    assert!(report
        .result
        .outcomes()
        .iter()
        .all(|o| matches!(o, RecordOutcome::Created { .. })));
    assert_eq!(store.count("account"), 3);
}

#[tokio::test]
async fn all_existing_batch_produces_zero_creates() {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "account", vec![account("Alpha"), account("Bravo")]).await;
    let engine = engine_for(&store);

    let report = engine
        .reconcile("account", vec![account("Alpha"), account("Bravo")], &no_fields)
        .await
        .unwrap();

    assert_eq!(report.summary.created, 0);
    assert_eq!(report.summary.updated, 2);
    assert_eq!(store.count("account"), 2);
}

#[tokio::test]
async fn consecutive_runs_are_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_for(&store);
    let batch = || vec![account("Doe"), account("Jane")];

    let first = engine.reconcile("account", batch(), &no_fields).await.unwrap();
    assert_eq!(first.summary.created, 2);

    // the engine rebuilds the index from the now-current store state
    let second = engine.reconcile("account", batch(), &no_fields).await.unwrap();
    assert_eq!(second.summary.created, 0);
    assert_eq!(second.summary.updated, 2);
    assert_eq!(store.count("account"), 2);
}

#[tokio::test]
async fn duplicate_keys_in_one_batch_create_once_and_link() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_for(&store);

    let report = engine
        .reconcile("account", vec![account("Doe"), account("Doe")], &no_fields)
        .await
        .unwrap();

    assert_eq!(report.summary.created, 1);
    assert_eq!(report.summary.linked, 1);
    assert_eq!(store.count("account"), 1);

    let created_id = match report.result.get(0) {
        Some(RecordOutcome::Created { id }) => id.clone(),
        other => panic!("expected Created for first record, got {other:?}"),
    };
    match report.result.get(1) {
        Some(RecordOutcome::Linked { id }) => assert_eq!(id, &created_id),
        other => panic!("expected Linked to the created id, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_record_does_not_block_siblings() {
    let store = Arc::new(MemoryStore::new());
    store.reject_when("Name", "Bravo");
    let engine = engine_for(&store);

    let report = engine
        .reconcile(
            "account",
            vec![account("Alpha"), account("Bravo"), account("Charlie")],
            &no_fields,
        )
        .await
        .unwrap();

    assert!(matches!(
        report.result.get(0),
        Some(RecordOutcome::Created { .. })
    ));
    match report.result.get(1) {
        Some(RecordOutcome::Failed {
            error: ReconcileError::RecordRejected { code, .. },
        }) => assert_eq!(code, "CONSTRAINT_VIOLATION"),
        other => panic!("expected RecordRejected for second record, got {other:?}"),
    }
    assert!(matches!(
        report.result.get(2),
        Some(RecordOutcome::Created { .. })
    ));

    assert_eq!(report.summary.created, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(store.count("account"), 2);
    // one bulk round-trip despite the rejection
    assert_eq!(store.create_calls(), 1);
}

#[tokio::test]
async fn contacts_link_to_accounts_by_last_name() {
    let store = Arc::new(MemoryStore::new());
    let account_ids = seed(&store, "account", vec![account("Doe")]).await;
    let existing_account = account_ids[0].clone();

    let contact_ids = seed(
        &store,
        "contact",
        vec![
            Record::new(FieldSet::new().with("LastName", "Doe")),
            Record::new(FieldSet::new().with("LastName", "Jane")),
        ],
    )
    .await;

    // desired account records, each annotated with its source contact id
    let incoming: Vec<Record> = [("Doe", &contact_ids[0]), ("Jane", &contact_ids[1])]
        .into_iter()
        .map(|(last_name, contact_id)| account(last_name).with_id(contact_id.clone()))
        .collect();

    let engine = engine_for(&store);
    let report = engine
        .reconcile("account", incoming, &link_account)
        .await
        .unwrap();

    // "Doe" matched the existing account; "Jane" triggered a create
    match report.result.get(0) {
        Some(RecordOutcome::Linked { id }) => assert_eq!(id, &existing_account),
        other => panic!("expected Linked to the existing account, got {other:?}"),
    }
    let new_account = match report.result.get(1) {
        Some(RecordOutcome::Created { id }) => id.clone(),
        other => panic!("expected Created for Jane, got {other:?}"),
    };

    // exactly one new account, and both contacts carry a non-null AccountId
    assert_eq!(store.count("account"), 2);
    let doe_contact = store.find(&contact_ids[0]).unwrap();
    assert_eq!(
        doe_contact.fields.get_string("AccountId"),
        Some(existing_account.as_str())
    );
    let jane_contact = store.find(&contact_ids[1]).unwrap();
    assert_eq!(
        jane_contact.fields.get_string("AccountId"),
        Some(new_account.as_str())
    );

    // a second run settles into pure links, still one account per name
    let rerun: Vec<Record> = [("Doe", &contact_ids[0]), ("Jane", &contact_ids[1])]
        .into_iter()
        .map(|(last_name, contact_id)| account(last_name).with_id(contact_id.clone()))
        .collect();
    let second = engine.reconcile("account", rerun, &link_account).await.unwrap();
    assert_eq!(second.summary.created, 0);
    assert_eq!(second.summary.linked, 2);
    assert_eq!(store.count("account"), 2);
}

#[tokio::test]
async fn unreachable_store_fails_fast_before_planning() {
    let store = Arc::new(MemoryStore::new());
    store.set_unavailable(true);
    let engine = engine_for(&store);

    let err = engine
        .reconcile("account", vec![account("Doe")], &no_fields)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::StoreUnavailable { .. }));
    assert!(err.is_transient());
    assert_eq!(store.create_calls(), 0);
    assert_eq!(store.update_calls(), 0);
}

#[tokio::test]
async fn write_outage_marks_unsubmitted_records_failed() {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "account", vec![account("Doe")]).await;
    store.set_fail_writes(true);
    let engine = engine_for(&store);

    // one update, one create, and one same-batch link behind the create
    let report = engine
        .reconcile(
            "account",
            vec![account("Doe"), account("Jane"), account("Jane")],
            &no_fields,
        )
        .await
        .unwrap();

    assert_eq!(report.summary.failed, 3);
    assert!(matches!(
        report.result.get(0),
        Some(RecordOutcome::Failed {
            error: ReconcileError::StoreUnavailable { .. }
        })
    ));
    assert!(matches!(
        report.result.get(1),
        Some(RecordOutcome::Failed {
            error: ReconcileError::StoreUnavailable { .. }
        })
    ));
    // the link's create never happened, so its target cannot resolve
    assert!(matches!(
        report.result.get(2),
        Some(RecordOutcome::Failed {
            error: ReconcileError::LinkTargetFailed { .. }
        })
    ));
    assert_eq!(store.count("account"), 1);
}

#[tokio::test]
async fn link_behind_a_rejected_create_fails_while_siblings_succeed() {
    let store = Arc::new(MemoryStore::new());
    store.reject_when("Name", "Jane");
    let engine = engine_for(&store);

    // the second "Jane" links to a create the store rejects per-record
    let report = engine
        .reconcile(
            "account",
            vec![account("Jane"), account("Jane"), account("Alpha")],
            &no_fields,
        )
        .await
        .unwrap();

    assert!(matches!(
        report.result.get(0),
        Some(RecordOutcome::Failed {
            error: ReconcileError::RecordRejected { .. }
        })
    ));
    assert!(matches!(
        report.result.get(1),
        Some(RecordOutcome::Failed {
            error: ReconcileError::LinkTargetFailed { .. }
        })
    ));
    assert!(matches!(
        report.result.get(2),
        Some(RecordOutcome::Created { .. })
    ));

    assert_eq!(report.summary.created, 1);
    assert_eq!(report.summary.failed, 2);
    assert_eq!(store.count("account"), 1);
}

#[tokio::test]
async fn missing_natural_key_aborts_before_any_store_call() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_for(&store);

    let err = engine
        .reconcile(
            "account",
            vec![account("Doe"), Record::new(FieldSet::new())],
            &no_fields,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Validation { index: 1, .. }));
    assert_eq!(store.query_calls(), 0);
    assert_eq!(store.create_calls(), 0);
    assert_eq!(store.update_calls(), 0);
}

#[tokio::test]
async fn preview_plans_without_writing() {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "account", vec![account("Doe")]).await;
    let engine = engine_for(&store);

    let plan = engine
        .preview("account", vec![account("Doe"), account("Jane")], &no_fields)
        .await
        .unwrap();

    assert_eq!(plan.updates(), 1);
    assert_eq!(plan.creates(), 1);
    assert_eq!(store.create_calls(), 1); // the seed call only
    assert_eq!(store.update_calls(), 0);
    assert_eq!(store.count("account"), 1);
}
