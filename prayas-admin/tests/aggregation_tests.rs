//! Result aggregation job tests

use prayas_admin::aggregate;
use prayas_common::db::{collections, connect_in_memory, DocumentStore};
use serde_json::json;

async fn store_with_roster() -> DocumentStore {
    let store = DocumentStore::new(connect_in_memory().await.unwrap());

    store
        .put(
            collections::USERS,
            "u1",
            &json!({
                "name": "Asha", "class": "Class 9", "batch": "Lakshya",
                "role": "student", "email": "asha@example.com"
            }),
        )
        .await
        .unwrap();
    store
        .put(
            collections::USERS,
            "u2",
            &json!({
                "name": "Ravi", "class": "Class 10", "batch": "Udaan",
                "role": "student", "email": "ravi@example.com"
            }),
        )
        .await
        .unwrap();
    // Teachers are filtered out of the join
    store
        .put(
            collections::USERS,
            "u3",
            &json!({
                "name": "Meera", "class": "", "batch": "",
                "role": "teacher", "email": "meera@example.com"
            }),
        )
        .await
        .unwrap();

    store
}

async fn add_score(store: &DocumentStore, id: &str, name: &str, class: &str, subject: &str, marks: f64) {
    store
        .put(
            collections::RESULTS,
            id,
            &json!({
                "name": name, "class": class, "subject": subject,
                "marks": marks, "outOf": 100.0, "remarks": "",
                "testDate": "2026-08-01", "createdAt": "2026-08-02T00:00:00Z"
            }),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn two_subjects_group_into_one_summary_in_encounter_order() {
    let store = store_with_roster().await;
    add_score(&store, "r1", "Asha", "Class 9", "Math", 88.0).await;
    add_score(&store, "r2", "Asha", "Class 9", "Science", 91.0).await;

    let report = aggregate::aggregate_results(&store).await.unwrap();

    assert_eq!(report.written, 1);
    assert!(report.warnings.is_empty());

    let summary = collections::get_summary(&store, "Asha_Class 9_Lakshya")
        .await
        .unwrap()
        .expect("summary document keyed by sanitized name+class+batch");
    assert_eq!(summary.name, "Asha");
    assert_eq!(summary.batch, "Lakshya");
    assert_eq!(summary.results.len(), 2);
    // Order encountered, not test-date order
    assert_eq!(summary.results[0].subject, "Math");
    assert_eq!(summary.results[0].marks, 88.0);
    assert_eq!(summary.results[1].subject, "Science");
    assert_eq!(summary.results[1].marks, 91.0);
}

#[tokio::test]
async fn rerunning_overwrites_instead_of_duplicating() {
    let store = store_with_roster().await;
    add_score(&store, "r1", "Asha", "Class 9", "Math", 88.0).await;
    add_score(&store, "r2", "Ravi", "Class 10", "Math", 72.0).await;

    let first = aggregate::aggregate_results(&store).await.unwrap();
    let second = aggregate::aggregate_results(&store).await.unwrap();

    assert_eq!(first.written, 2);
    assert_eq!(second.written, 2);
    // Running twice yields the same N documents, not 2N
    assert_eq!(store.count(collections::SUMMARIES).await.unwrap(), 2);

    let summary = collections::get_summary(&store, "Asha_Class 9_Lakshya")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.results.len(), 1, "overwrite, not append");
}

#[tokio::test]
async fn unmatched_score_warns_and_does_not_abort_the_rest() {
    let store = store_with_roster().await;
    add_score(&store, "r1", "Nobody", "Class 7", "Math", 50.0).await;
    add_score(&store, "r2", "Asha", "Class 9", "Science", 91.0).await;

    let report = aggregate::aggregate_results(&store).await.unwrap();

    assert_eq!(report.written, 1, "the matched score still lands");
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Nobody"), "warning names the orphan: {}", report.warnings[0]);
    assert!(
        collections::get_summary(&store, "Asha_Class 9_Lakshya").await.unwrap().is_some()
    );
}

#[tokio::test]
async fn whitespace_in_names_still_joins() {
    let store = store_with_roster().await;
    add_score(&store, "r1", "  Asha  ", " Class 9 ", "Math", 88.0).await;

    let report = aggregate::aggregate_results(&store).await.unwrap();

    assert_eq!(report.written, 1);
    assert!(collections::get_summary(&store, "Asha_Class 9_Lakshya").await.unwrap().is_some());
}

#[tokio::test]
async fn duplicate_roster_entries_use_first_match_with_warning() {
    let store = store_with_roster().await;
    // Second roster entry with the same trimmed (name, class), other batch
    store
        .put(
            collections::USERS,
            "u4",
            &json!({
                "name": " Asha", "class": "Class 9 ", "batch": "Safalta",
                "role": "student", "email": "asha2@example.com"
            }),
        )
        .await
        .unwrap();
    add_score(&store, "r1", "Asha", "Class 9", "Math", 88.0).await;

    let report = aggregate::aggregate_results(&store).await.unwrap();

    assert_eq!(report.written, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Multiple roster entries"));
    // First match (insertion order) wins
    assert!(collections::get_summary(&store, "Asha_Class 9_Lakshya").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_all_on_empty_collection_reports_nothing_to_delete() {
    let store = store_with_roster().await;

    let report = aggregate::delete_all_summaries(&store).await.unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(report.message, "Nothing to delete");
}

#[tokio::test]
async fn delete_all_removes_every_summary_and_reports_the_count() {
    let store = store_with_roster().await;
    add_score(&store, "r1", "Asha", "Class 9", "Math", 88.0).await;
    add_score(&store, "r2", "Ravi", "Class 10", "Math", 72.0).await;
    aggregate::aggregate_results(&store).await.unwrap();

    let report = aggregate::delete_all_summaries(&store).await.unwrap();

    assert_eq!(report.deleted, 2);
    assert_eq!(store.count(collections::SUMMARIES).await.unwrap(), 0);
}
