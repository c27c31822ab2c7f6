//! Student Store
//!
//! Owns every student's state for the lifetime of the process. Each student sits
//! behind its own async mutex, so one sender's messages are handled strictly one
//! at a time (the lock is held across text-generation round-trips) while
//! different senders proceed in parallel. The outer map is a `DashMap`, which
//! shards its own locking and is never held across an await.

use crate::student::StudentState;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub type StudentHandle = Arc<Mutex<StudentState>>;

#[derive(Default)]
pub struct StudentStore {
    students: DashMap<String, StudentHandle>,
    transcript_limit: Option<usize>,
}

impl StudentStore {
    pub fn new(transcript_limit: Option<usize>) -> Self {
        Self {
            students: DashMap::new(),
            transcript_limit,
        }
    }

    /// Returns the student's handle, creating a fresh onboarding state on first contact.
    pub fn get_or_create(&self, sender_id: &str) -> StudentHandle {
        if let Some(existing) = self.students.get(sender_id) {
            return existing.value().clone();
        }
        self.students
            .entry(sender_id.to_string())
            .or_insert_with(|| {
                info!(sender = %sender_id, "New student");
                Arc::new(Mutex::new(StudentState::new(self.transcript_limit)))
            })
            .value()
            .clone()
    }

    pub fn get(&self, sender_id: &str) -> Option<StudentHandle> {
        self.students.get(sender_id).map(|s| s.value().clone())
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Forgets every student and returns how many were dropped. A handle
    /// already held by an in-flight message stays valid but is no longer
    /// reachable; the sender's next message starts over.
    pub fn clear(&self) -> usize {
        let count = self.students.len();
        self.students.clear();
        info!(count, "Student store cleared");
        count
    }
}
