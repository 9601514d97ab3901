//! Round-robin topic selection.
//!
//! The rotator owns a fixed, non-empty topic list and a cursor. Each call to
//! [`TopicRotator::next`] returns the topic under the cursor and advances it,
//! wrapping to the first topic after the last. There is no randomness; the
//! sequence is fully determined by the list and the start index.

use crate::{Result, SimError, Topic};

/// Ordered, fixed topic list with a wrapping cursor.
#[derive(Debug, Clone)]
pub struct TopicRotator {
    topics: Vec<Topic>,
    index: usize,
}

impl TopicRotator {
    /// Create a rotator starting at the first topic.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MissingConfig`] if `topics` is empty.
    pub fn new<I, T>(topics: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Topic>,
    {
        Self::with_start(topics, 0)
    }

    /// Create a rotator whose first `next()` returns `topics[start % len]`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MissingConfig`] if `topics` is empty.
    pub fn with_start<I, T>(topics: I, start: usize) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Topic>,
    {
        // ---
        let topics: Vec<Topic> = topics.into_iter().map(Into::into).collect();
        if topics.is_empty() {
            return Err(SimError::MissingConfig("at least one topic".into()));
        }

        let index = start % topics.len();
        Ok(Self { topics, index })
    }

    /// Single fixed topic; `next()` always returns it.
    pub fn single(topic: impl Into<Topic>) -> Self {
        Self {
            topics: vec![topic.into()],
            index: 0,
        }
    }

    /// Return the current topic and advance the cursor with wraparound.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Topic {
        // ---
        let topic = self.topics[self.index].clone();
        self.index = (self.index + 1) % self.topics.len();
        topic
    }

    /// Topic the next call to `next()` will return.
    pub fn peek(&self) -> &Topic {
        &self.topics[self.index]
    }

    /// Current cursor position, always in `[0, len)`.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Always false; construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

/// Vehicle kind encoded in a topic: its last path segment.
pub fn vehicle_kind_of(topic: &Topic) -> &str {
    topic.last_segment()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn names(topics: &[Topic]) -> Vec<&str> {
        topics.iter().map(Topic::as_str).collect()
    }

    #[test]
    fn test_rotation_wraps_for_any_start() {
        // ---
        let list = ["topic/truck", "topic/sedan", "topic/suv"];
        let len = list.len();

        for start in 0..len {
            for extra in 0..7 {
                let mut rotator = TopicRotator::with_start(list, start).unwrap();
                let got: Vec<Topic> = (0..len + extra).map(|_| rotator.next()).collect();

                let expected: Vec<&str> = (0..len + extra).map(|i| list[(start + i) % len]).collect();
                assert_eq!(names(&got), expected, "start={start} extra={extra}");
            }
        }
    }

    #[test]
    fn test_start_index_reduced_modulo_len() {
        // ---
        let mut rotator = TopicRotator::with_start(["a", "b"], 5).unwrap();
        assert_eq!(rotator.len(), 2);
        assert_eq!(rotator.index(), 1);
        assert_eq!(rotator.next().as_str(), "b");
        assert_eq!(rotator.next().as_str(), "a");
    }

    #[test]
    fn test_empty_list_rejected() {
        // ---
        let result = TopicRotator::new(Vec::<String>::new());
        assert!(matches!(result, Err(SimError::MissingConfig(_))));
    }

    #[test]
    fn test_single_topic_repeats() {
        // ---
        let mut rotator = TopicRotator::single("topic/test");
        for _ in 0..5 {
            assert_eq!(rotator.next().as_str(), "topic/test");
            assert_eq!(rotator.index(), 0);
        }
    }

    #[test]
    fn test_peek_matches_next() {
        // ---
        let mut rotator = TopicRotator::new(["x", "y"]).unwrap();
        let peeked = rotator.peek().clone();
        assert_eq!(rotator.next(), peeked);
        assert_eq!(rotator.peek().as_str(), "y");
    }

    #[test]
    fn test_vehicle_kind_of() {
        // ---
        assert_eq!(vehicle_kind_of(&Topic::from("topic/truck")), "truck");
        assert_eq!(vehicle_kind_of(&Topic::from("fleet/seoul/suv")), "suv");
    }
}
