//! Buffered field tracking.

/// The set of fields whose cached value has not reached the native widget.
///
/// Each field appears at most once (last write wins) and fields are ordered by
/// the time of their most recent write, so a later write of field `a` moves it
/// behind a field `b` written in between.
#[derive(Debug, Clone)]
pub struct PendingFields<F> {
    order: Vec<F>,
}

impl<F> Default for PendingFields<F> {
    fn default() -> Self {
        Self { order: Vec::new() }
    }
}

impl<F: Copy + Eq> PendingFields<F> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write of `field`.
    pub fn mark(&mut self, field: F) {
        self.order.retain(|f| *f != field);
        self.order.push(field);
    }

    /// Remove and return every pending field in last-write order.
    pub fn drain(&mut self) -> Vec<F> {
        std::mem::take(&mut self.order)
    }

    /// The pending fields in last-write order.
    pub fn as_slice(&self) -> &[F] {
        &self.order
    }

    /// Forget every pending field.
    pub fn clear(&mut self) {
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Field {
        Text,
        Size,
        Visible,
    }

    #[test]
    fn test_last_write_order() {
        let mut pending = PendingFields::new();
        pending.mark(Field::Text);
        pending.mark(Field::Size);
        pending.mark(Field::Text);
        pending.mark(Field::Visible);

        assert_eq!(pending.drain(), vec![Field::Size, Field::Text, Field::Visible]);
        assert!(pending.as_slice().is_empty());
    }
}
