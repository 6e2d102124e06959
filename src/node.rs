//! A single heap slot.
//!
//! [`Node`] carries the element, an explicit occupied flag and the free
//! capacity of the subtree rooted at the slot. It does no locking: every
//! node lives inside its level's mutex, so holding `&mut Node` already proves
//! the caller owns the level.

/// One slot of the heap array.
///
/// # Invariant
/// `free_capacity = (occupied ? 0 : 1) + free(left) + free(right)`, with
/// missing children counting as 0. Maintained incrementally by insert and
/// extract, recomputed wholesale by growth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<E> {
    element: Option<E>,
    occupied: bool,
    free_capacity: u64,
}

impl<E> Default for Node<E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<E> Node<E> {
    /// An unoccupied leaf slot: free capacity 1 (itself).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            element: None,
            occupied: false,
            free_capacity: 1,
        }
    }

    /// Whether the slot holds an element.
    #[inline]
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Empty slots in the subtree rooted here, including this one.
    #[inline]
    #[must_use]
    pub const fn free_capacity(&self) -> u64 {
        self.free_capacity
    }

    /// The stored element, if occupied.
    #[inline]
    #[must_use]
    pub const fn element(&self) -> Option<&E> {
        self.element.as_ref()
    }

    /// Store `element` into an empty slot.
    ///
    /// Does not touch the free capacity; callers account for it separately
    /// because a filled slot and a slot that merely passes an element down
    /// both consume one unit of their subtree's capacity.
    #[inline]
    pub fn fill(&mut self, element: E) {
        debug_assert!(!self.occupied, "fill() on an occupied slot");
        self.element = Some(element);
        self.occupied = true;
    }

    /// Exchange the stored element with `incoming`.
    ///
    /// On an empty slot nothing is exchanged.
    #[inline]
    pub fn swap(&mut self, incoming: &mut E) {
        debug_assert!(self.occupied, "swap() on an empty slot");
        if let Some(stored) = self.element.as_mut() {
            std::mem::swap(stored, incoming);
        }
    }

    /// Remove the element, leaving the slot empty.
    ///
    /// Like [`fill`](Self::fill), leaves the free capacity alone.
    #[inline]
    pub fn vacate(&mut self) -> Option<E> {
        self.occupied = false;
        self.element.take()
    }

    /// One slot of this subtree was consumed.
    #[inline]
    pub fn consume_capacity(&mut self) {
        debug_assert!(self.free_capacity > 0, "free capacity underflow");
        self.free_capacity = self.free_capacity.saturating_sub(1);
    }

    /// One slot of this subtree was released.
    #[inline]
    pub const fn release_capacity(&mut self) {
        self.free_capacity += 1;
    }

    /// Overwrite the free capacity (bottom-up recomputation only).
    #[inline]
    pub const fn set_free_capacity(&mut self, free_capacity: u64) {
        self.free_capacity = free_capacity;
    }

    /// This slot's own contribution to its subtree's free capacity.
    #[inline]
    #[must_use]
    pub const fn own_capacity(&self) -> u64 {
        if self.occupied { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_node() {
        let node: Node<u32> = Node::empty();

        assert!(!node.is_occupied());
        assert_eq!(node.free_capacity(), 1);
        assert_eq!(node.element(), None);
        assert_eq!(node.own_capacity(), 1);
    }

    #[test]
    fn test_fill_and_vacate() {
        let mut node: Node<u32> = Node::empty();

        node.fill(7);
        node.consume_capacity();
        assert!(node.is_occupied());
        assert_eq!(node.element(), Some(&7));
        assert_eq!(node.free_capacity(), 0);
        assert_eq!(node.own_capacity(), 0);

        assert_eq!(node.vacate(), Some(7));
        node.release_capacity();
        assert!(!node.is_occupied());
        assert_eq!(node.free_capacity(), 1);
    }

    #[test]
    fn test_swap_exchanges_element() {
        let mut node: Node<u32> = Node::empty();
        node.fill(3);

        let mut carried: u32 = 9;
        node.swap(&mut carried);

        assert_eq!(carried, 3);
        assert_eq!(node.element(), Some(&9));
        assert!(node.is_occupied());
    }
}
