// libs/call-session-cell/src/services/handled.rs
use std::collections::HashSet;

/// Appointment ids the patient already answered, declined or hung up on.
///
/// A handled id never rings again while the doctor keeps the call started.
/// The poller releases an id once it sees `appointment_started == false`,
/// which lets a fresh start by the doctor ring again.
#[derive(Debug, Clone, Default)]
pub struct HandledSet {
    ids: HashSet<String>,
}

impl HandledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, appointment_id: &str) -> bool {
        self.ids.insert(appointment_id.to_string())
    }

    pub fn contains(&self, appointment_id: &str) -> bool {
        self.ids.contains(appointment_id)
    }

    pub fn release(&mut self, appointment_id: &str) -> bool {
        self.ids.remove(appointment_id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sorted, for stable snapshots.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut handled = HandledSet::new();
        assert!(handled.insert("a1"));
        assert!(!handled.insert("a1"));
        assert_eq!(handled.len(), 1);
    }

    #[test]
    fn test_release_and_sorted_ids() {
        let mut handled = HandledSet::new();
        handled.insert("b");
        handled.insert("a");

        assert_eq!(handled.ids(), vec!["a".to_string(), "b".to_string()]);
        assert!(handled.release("a"));
        assert!(!handled.release("a"));
        assert!(!handled.contains("a"));
        assert!(handled.contains("b"));

        handled.clear();
        assert!(handled.is_empty());
    }
}
