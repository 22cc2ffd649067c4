use chrono::{DateTime, Local};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub delivered_at: DateTime<Local>,
    pub message: String,
}

/// Last delivered alerts, oldest evicted first.
#[derive(Debug, Clone)]
pub struct AlertHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl AlertHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            delivered_at: Local::now(),
            message: format!("alert {}", n),
        }
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut history = AlertHistory::new(10);
        for n in 0..12 {
            history.push(entry(n));
        }
        assert_eq!(history.len(), 10);
        let messages: Vec<_> = history.newest_first().map(|e| e.message.as_str()).collect();
        assert_eq!(messages.first(), Some(&"alert 11"));
        assert_eq!(messages.last(), Some(&"alert 2"));
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut history = AlertHistory::new(0);
        history.push(entry(0));
        assert!(history.is_empty());
    }
}
