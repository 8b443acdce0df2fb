//! Surrogate key allocation

/// Dense surrogate key sequence scoped to one builder invocation
///
/// Keys start at 1 and follow first-seen order of the business keys, which
/// keeps runs reproducible from input order alone.
#[derive(Debug, Default)]
pub struct KeySequence {
    next: i64,
}

impl KeySequence {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate the next key
    pub fn next_key(&mut self) -> i64 {
        self.next += 1;
        self.next
    }

    /// Number of keys handed out so far
    pub fn allocated(&self) -> i64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_dense_from_one() {
        let mut seq = KeySequence::new();
        assert_eq!(seq.next_key(), 1);
        assert_eq!(seq.next_key(), 2);
        assert_eq!(seq.next_key(), 3);
        assert_eq!(seq.allocated(), 3);
    }
}
