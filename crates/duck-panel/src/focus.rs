//! FocusRing — keyboard focus cycling between panes.

pub struct FocusRing<T> {
    items: Vec<T>,
    current: usize,
}

impl<T: Copy + PartialEq> FocusRing<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, current: 0 }
    }

    pub fn current(&self) -> Option<T> {
        self.items.get(self.current).copied()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn next(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.items.len();
        self.current()
    }

    pub fn prev(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        self.current = if self.current == 0 {
            self.items.len() - 1
        } else {
            self.current - 1
        };
        self.current()
    }

    /// Focus the Nth item (0-indexed).  No-op if out of bounds.
    pub fn set_by_position(&mut self, pos: usize) -> Option<T> {
        if pos < self.items.len() {
            self.current = pos;
            self.current()
        } else {
            None
        }
    }

    pub fn is_focused(&self, item: T) -> bool {
        self.current() == Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_both_ways() {
        let mut ring = FocusRing::new(vec!['a', 'b', 'c']);
        assert_eq!(ring.current(), Some('a'));
        assert_eq!(ring.prev(), Some('c'));
        assert_eq!(ring.next(), Some('a'));
        assert_eq!(ring.next(), Some('b'));
        assert_eq!(ring.set_by_position(7), None);
        assert!(ring.is_focused('b'));
    }

    #[test]
    fn test_empty_ring() {
        let mut ring: FocusRing<u8> = FocusRing::new(vec![]);
        assert_eq!(ring.next(), None);
        assert_eq!(ring.current(), None);
    }
}
