//! Bounded FIFO window of recent messages.

use std::collections::VecDeque;
use tierline_core::message::Message;

#[derive(Debug, Clone)]
pub struct ContextWindow {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl ContextWindow {
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest messages beyond capacity. Returns how many were evicted.
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push_back(message);
        let mut evicted = 0;
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// The most recent `limit` messages, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_never_exceeds_capacity() {
        let mut window = ContextWindow::new(4);
        for i in 0..20 {
            window.push(Message::user(format!("m{i}")));
            assert!(window.len() <= 4);
        }
    }

    #[test]
    fn eviction_is_strict_fifo() {
        let mut window = ContextWindow::new(3);
        for i in 0..3 {
            assert_eq!(window.push(Message::user(format!("m{i}"))), 0);
        }
        assert_eq!(window.push(Message::user("m3")), 1);

        let contents: Vec<String> = window.messages().map(|m| m.content.clone()).collect();
        assert_eq!(contents, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut window = ContextWindow::new(6);
        for i in 0..5 {
            window.push(Message::user(format!("m{i}")));
        }
        let tail: Vec<String> = window.recent(2).into_iter().map(|m| m.content).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
        assert_eq!(window.recent(50).len(), 5);
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut window = ContextWindow::new(0);
        window.push(Message::user("a"));
        window.push(Message::user("b"));
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.recent(1)[0].content, "b");
    }
}
