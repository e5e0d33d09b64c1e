//! Result aggregation job
//!
//! Manually triggered batch that reshapes the flat per-subject score
//! list into one denormalized summary document per student. Summary
//! keys are deterministic, so re-running the job overwrites instead of
//! duplicating. No transaction wraps the batch: an unexpected failure
//! leaves the writes made so far applied.

use chrono::Utc;
use prayas_common::models::{AggregatedResult, SubjectResult};
use prayas_common::Result;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::db::{collections, DocumentStore};

/// Outcome of one aggregation run
#[derive(Debug)]
pub struct AggregationReport {
    /// Number of summary documents written
    pub written: usize,
    /// Non-fatal warnings: unmatched scores, ambiguous roster matches
    pub warnings: Vec<String>,
}

/// Run the aggregation: roster join, group, upsert one summary per
/// student, report the count written.
pub async fn aggregate_results(store: &DocumentStore) -> Result<AggregationReport> {
    let students = collections::list_students(store).await?;
    let scores = collections::list_scores(store).await?;
    info!(
        "Aggregating {} score record(s) against {} student(s)",
        scores.len(),
        students.len()
    );

    let mut warnings = Vec::new();
    // Group insertion order preserved so summaries keep the order
    // scores were encountered, not test-date order
    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, AggregatedResult> = HashMap::new();

    for score in &scores {
        let name = score.name.trim();
        let class = score.class.trim();

        let mut matches = students
            .iter()
            .filter(|s| s.name.trim() == name && s.class.trim() == class);

        let student = match matches.next() {
            Some(student) => student,
            None => {
                let message = format!(
                    "No roster match for '{}' ({}) — {} score skipped",
                    name, class, score.subject
                );
                warn!("{message}");
                warnings.push(message);
                continue;
            }
        };
        if matches.next().is_some() {
            // Duplicate-student behavior is unresolved; first match wins
            let message = format!("Multiple roster entries for '{}' ({}); using the first", name, class);
            warn!("{message}");
            warnings.push(message);
        }

        let doc_id = AggregatedResult::derive_doc_id(name, class, &student.batch);
        let group = groups.entry(doc_id.clone()).or_insert_with(|| {
            group_order.push(doc_id.clone());
            AggregatedResult {
                doc_id,
                name: name.to_string(),
                class: class.to_string(),
                batch: student.batch.clone(),
                results: Vec::new(),
            }
        });
        group.results.push(SubjectResult {
            subject: score.subject.clone(),
            marks: score.marks,
            out_of: score.out_of,
            remarks: score.remarks.clone(),
            test_date: score.test_date.clone(),
            added_at: Utc::now(),
        });
    }

    let mut written = 0;
    for doc_id in &group_order {
        let summary = &groups[doc_id];
        collections::upsert_summary(store, summary).await?;
        written += 1;
    }

    info!(
        "Aggregation complete: {} summary document(s) written, {} warning(s)",
        written,
        warnings.len()
    );
    Ok(AggregationReport { written, warnings })
}

/// Outcome of a delete-all run
#[derive(Debug)]
pub struct PurgeReport {
    pub deleted: usize,
    pub message: String,
}

/// Delete every aggregated summary document, one at a time.
///
/// Destructive and irreversible; callers must have confirmed with the
/// user first. An empty collection reports "nothing to delete" rather
/// than an error. A failure mid-loop aborts the rest and leaves the
/// deletions made so far applied.
pub async fn delete_all_summaries(store: &DocumentStore) -> Result<PurgeReport> {
    let ids = collections::list_summary_ids(store).await?;
    if ids.is_empty() {
        info!("Delete-all: summary collection already empty");
        return Ok(PurgeReport {
            deleted: 0,
            message: "Nothing to delete".to_string(),
        });
    }

    let mut deleted = 0;
    for doc_id in &ids {
        collections::delete_summary(store, doc_id).await?;
        deleted += 1;
    }

    info!("Delete-all: removed {deleted} summary document(s)");
    Ok(PurgeReport {
        deleted,
        message: format!("Deleted {deleted} summary document(s)"),
    })
}
