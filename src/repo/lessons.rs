//! Lessons, kept in a dense 1..N order per course

use super::{find, insert};
use crate::entities::{new_id, Entity, Lesson};
use crate::error::{Error, Result};
use crate::git::Transaction;
use crate::query::filter::Filter;
use crate::schema::catalog::LESSONS;
use crate::Database;
use chrono::Utc;

/// Append a lesson at the end of a course
pub async fn add(db: &Database, course_id: &str, title: &str, content: &str) -> Result<Lesson> {
    let next_order = list_for_course(db, course_id)
        .await?
        .last()
        .map(|l| l.order + 1)
        .unwrap_or(1);

    let now = Utc::now();
    let lesson = Lesson {
        id: new_id(),
        course_id: course_id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        order: next_order,
        created_at: Some(now),
        updated_at: Some(now),
    };

    insert(db, &lesson).await?;
    Ok(lesson)
}

pub async fn get(db: &Database, id: &str) -> Result<Option<Lesson>> {
    super::load(db, id).await
}

/// Lessons of a course by ascending order
pub async fn list_for_course(db: &Database, course_id: &str) -> Result<Vec<Lesson>> {
    let mut lessons: Vec<Lesson> = find(db, &Filter::eq("course_id", course_id)).await?;
    lessons.sort_by_key(|l| l.order);
    Ok(lessons)
}

/// Delete a lesson and close the gap it leaves.
///
/// Every later lesson of the same course moves up by one; the deletion and
/// the renumbering land in a single commit. The renumbered lessons are
/// validated before anything is written, and a failed write puts back every
/// lesson already touched. Returns how many lessons were renumbered.
pub async fn remove(db: &Database, lesson_id: &str) -> Result<usize> {
    let lesson: Lesson = super::require(db, lesson_id).await?;

    let later: Vec<Lesson> = list_for_course(db, &lesson.course_id)
        .await?
        .into_iter()
        .filter(|l| l.order > lesson.order)
        .collect();

    let now = Utc::now();
    let renumbered: Vec<Lesson> = later
        .iter()
        .cloned()
        .map(|mut next| {
            next.order -= 1;
            next.updated_at = Some(now);
            next
        })
        .collect();
    for next in &renumbered {
        db.validate(LESSONS, &next.to_document()).await?;
    }

    let mut tx = db.transaction(format!("Remove lesson {} from course {}", lesson.id, lesson.course_id));
    if let Err(e) = apply_removal(db, &mut tx, &lesson, &renumbered).await {
        tracing::warn!("Abandoned removal of lesson {}: {}", lesson.id, e);
        restore(db, &lesson, &later).await;
        return Err(e);
    }

    db.commit_transaction(tx)?;
    tracing::info!(
        "Removed lesson {} and renumbered {} lessons in course {}",
        lesson_id,
        renumbered.len(),
        lesson.course_id
    );
    Ok(renumbered.len())
}

async fn apply_removal(
    db: &Database,
    tx: &mut Transaction<'_>,
    lesson: &Lesson,
    renumbered: &[Lesson],
) -> Result<()> {
    if !db.delete(LESSONS, &lesson.id).await? {
        return Err(Error::NotFound {
            collection: LESSONS.to_string(),
            id: lesson.id.clone(),
        });
    }
    tx.record(format!("deleted {} (order {})", lesson.id, lesson.order));

    for next in renumbered {
        db.update(LESSONS, &next.to_document()).await?;
        tx.record(format!("{} -> order {}", next.id, next.order));
    }
    Ok(())
}

/// Write back the removed lesson and the original orders
async fn restore(db: &Database, lesson: &Lesson, later: &[Lesson]) {
    let collection = match db.collection(LESSONS) {
        Ok(collection) => collection,
        Err(e) => {
            tracing::error!("Could not restore lessons of course {}: {}", lesson.course_id, e);
            return;
        }
    };
    for original in std::iter::once(lesson).chain(later) {
        if let Err(e) = collection.upsert(&original.to_document()).await {
            tracing::error!("Could not restore lesson {}: {}", original.id, e);
        }
    }
}
