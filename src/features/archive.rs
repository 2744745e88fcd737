//! Moving aged enrollments into the archive collection
//!
//! Mark-and-sweep over two passes:
//!
//! 1. **Copy**: every enrollment older than the cutoff is upserted into the
//!    archive with an `archived_at` stamp. A failed copy is reported and the
//!    live document is left alone.
//! 2. **Sweep**: every live enrollment older than the cutoff whose id is
//!    present in the archive is deleted. Newer live documents are kept even
//!    when a stale archive copy shares their id.
//!
//! The sweep only looks at what the archive holds, so rerunning after an
//! interrupted run finishes the move without duplicating archive entries.

use crate::error::Result;
use crate::query::filter::Filter;
use crate::schema::catalog::ENROLLMENTS;
use crate::Database;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of one archive run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArchiveReport {
    /// Live enrollments older than the cutoff
    pub candidates: usize,
    /// Copied into the archive by this run
    pub archived: usize,
    /// Removed from the live collection by this run
    pub deleted: usize,
    pub failures: Vec<ArchiveFailure>,
}

/// Archive every enrollment dated strictly before `cutoff`
pub async fn archive_older_than(db: &Database, cutoff: DateTime<Utc>) -> Result<ArchiveReport> {
    let archive = db.config.archive_collection.clone();
    let mut report = ArchiveReport::default();
    let mut tx = db.transaction(format!("Archive enrollments older than {}", cutoff.format("%Y-%m-%d")));

    let aged = Filter::lt("enrollment_date", cutoff);

    // Copy
    let candidates = db.find(ENROLLMENTS, &aged).await?;
    report.candidates = candidates.len();
    let archived_at = Utc::now();

    for doc in candidates {
        let mut copy = doc.clone();
        copy.set("archived_at", archived_at);
        match db.upsert(&archive, &copy).await {
            Ok(()) => {
                report.archived += 1;
                tx.record(format!("archived {}", doc.id));
            }
            Err(e) => {
                tracing::warn!("Could not archive enrollment {}: {}", doc.id, e);
                report.failures.push(ArchiveFailure {
                    id: doc.id,
                    reason: e.to_string(),
                });
            }
        }
    }

    // Sweep
    let archive_handle = db.collection(&archive)?;
    for doc in db.find(ENROLLMENTS, &aged).await? {
        if !archive_handle.contains(&doc.id).await {
            continue;
        }
        match db.delete(ENROLLMENTS, &doc.id).await {
            Ok(true) => {
                report.deleted += 1;
                tx.record(format!("removed {} from {}", doc.id, ENROLLMENTS));
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Could not remove archived enrollment {}: {}", doc.id, e);
                report.failures.push(ArchiveFailure {
                    id: doc.id,
                    reason: e.to_string(),
                });
            }
        }
    }

    if !tx.is_empty() {
        db.commit_transaction(tx)?;
    }
    tracing::info!(
        "Archived {} of {} enrollments into '{}', removed {} ({} failures)",
        report.archived,
        report.candidates,
        archive,
        report.deleted,
        report.failures.len()
    );
    Ok(report)
}

/// Archive enrollments older than `days` days
pub async fn archive_older_than_days(db: &Database, days: i64) -> Result<ArchiveReport> {
    archive_older_than(db, Utc::now() - Duration::days(days)).await
}
