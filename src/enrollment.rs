use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::error::AssetResult;

/// Set-membership view of who may indirectly read assets attached to a
/// parent resource, plus its designated instructor. Owned by an external
/// course/lesson collaborator; this crate only queries and appends.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Subjects enrolled under `parent_id`; empty set when unknown
    async fn enrolled(&self, parent_id: &str) -> AssetResult<HashSet<String>>;

    /// Designated instructor of the parent resource, if any
    async fn instructor_of(&self, parent_id: &str) -> AssetResult<Option<String>>;

    /// Add `subject` to the enrollment set of `parent_id`
    async fn enroll(&self, parent_id: &str, subject: &str) -> AssetResult<()>;
}

#[derive(Default)]
struct ParentRecord {
    instructor: Option<String>,
    enrolled: HashSet<String>,
}

/// In-memory enrollment relation for tests and embedded use
#[derive(Default)]
pub struct MemoryEnrollmentStore {
    parents: RwLock<HashMap<String, ParentRecord>>,
}

impl MemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Designate an instructor for a parent resource (test/bootstrap helper)
    pub fn set_instructor(&self, parent_id: &str, subject: &str) {
        self.parents
            .write()
            .entry(parent_id.to_string())
            .or_default()
            .instructor = Some(subject.to_string());
    }
}

#[async_trait]
impl EnrollmentStore for MemoryEnrollmentStore {
    async fn enrolled(&self, parent_id: &str) -> AssetResult<HashSet<String>> {
        Ok(self
            .parents
            .read()
            .get(parent_id)
            .map(|r| r.enrolled.clone())
            .unwrap_or_default())
    }

    async fn instructor_of(&self, parent_id: &str) -> AssetResult<Option<String>> {
        Ok(self
            .parents
            .read()
            .get(parent_id)
            .and_then(|r| r.instructor.clone()))
    }

    async fn enroll(&self, parent_id: &str, subject: &str) -> AssetResult<()> {
        self.parents
            .write()
            .entry(parent_id.to_string())
            .or_default()
            .enrolled
            .insert(subject.to_string());
        Ok(())
    }
}
