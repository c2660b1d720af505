use std::collections::VecDeque;

/// Fixed capacity FIFO, the oldest item is evicted when pushing into a full window.
pub(crate) struct BoundedWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}
impl<T> BoundedWindow<T> {
    pub fn new(capacity: usize) -> Self {
        BoundedWindow {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    /// Appends the item, returns the evicted one if the window was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
    pub fn clear(&mut self) {
        self.items.clear();
    }
    /// Empties the window and changes its capacity.
    pub fn reset_with_capacity(&mut self, capacity: usize) {
        self.items.clear();
        self.items.reserve(capacity);
        self.capacity = capacity;
    }
}
impl<T: Copy> BoundedWindow<T> {
    /// True when the window is full and every item satisfies the predicate.
    pub fn is_saturated_with(&self, predicate: impl Fn(T) -> bool) -> bool {
        self.is_full() && self.items.iter().all(|item| predicate(*item))
    }
}
