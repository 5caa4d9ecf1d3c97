//! Price Level - resting orders at one price, in arrival order.
//!
//! The level itself stores only endpoints and running totals; the queue
//! body lives in the arena, threaded through each node's prev/next
//! handles. Arrival order encodes time priority, and any node can be
//! spliced out in constant time given its handle.

use crate::arena::{Arena, NodeIndex, NULL_INDEX};

/// Endpoints and aggregates for the orders resting at one price.
///
/// Earlier arrivals sit closer to the head and have priority; a cancel
/// unlinks its node wherever it sits without walking the queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct PriceLevel {
    /// Oldest resting order; first in time priority
    head: NodeIndex,
    /// Most recent arrival
    tail: NodeIndex,
    /// Sum of the resting sizes, maintained on every mutation
    total_size: u64,
    /// How many orders rest here
    count: u32,
}

impl PriceLevel {
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: NULL_INDEX,
            tail: NULL_INDEX,
            total_size: 0,
            count: 0,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Aggregate resting size. Maintained incrementally, never recomputed
    /// from the list.
    #[inline]
    pub const fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of resting orders.
    #[inline]
    pub const fn order_count(&self) -> u32 {
        self.count
    }

    /// Index of the oldest order, or `NULL_INDEX` if empty.
    #[inline]
    pub const fn head(&self) -> NodeIndex {
        self.head
    }

    /// Append an order at the tail (newest, lowest time priority).
    ///
    /// # Complexity
    /// O(1)
    pub fn push_back(&mut self, arena: &mut Arena, index: NodeIndex) {
        // Link the node behind the current tail; when the level is empty
        // the tail sentinel becomes the node's (null) predecessor.
        let size = {
            let node = arena.get_mut(index);
            node.prev = self.tail;
            node.next = NULL_INDEX;
            node.size
        };

        match self.tail {
            NULL_INDEX => self.head = index,
            tail => arena.get_mut(tail).next = index,
        }
        self.tail = index;

        self.count += 1;
        self.total_size += u64::from(size);
    }

    /// Splice an order out of the queue (for cancel).
    ///
    /// Each neighbor is relinked past the node; where a neighbor is
    /// missing, the level endpoint absorbs the link instead. The node is
    /// NOT freed from the arena; the caller does that.
    ///
    /// # Returns
    /// `true` if the level is now empty.
    ///
    /// # Complexity
    /// O(1)
    pub fn remove(&mut self, arena: &mut Arena, index: NodeIndex) -> bool {
        let (prev, next, size) = {
            let node = arena.get_mut(index);
            let out = (node.prev, node.next, node.size);
            node.prev = NULL_INDEX;
            node.next = NULL_INDEX;
            out
        };

        match prev {
            NULL_INDEX => self.head = next,
            prev => arena.get_mut(prev).next = next,
        }
        match next {
            NULL_INDEX => self.tail = prev,
            next => arena.get_mut(next).prev = prev,
        }

        self.count -= 1;
        self.total_size -= u64::from(size);
        self.is_empty()
    }

    /// Resize an order in place. Queue position is unchanged; only the
    /// aggregate moves by the delta.
    ///
    /// # Complexity
    /// O(1)
    pub fn set_size(&mut self, arena: &mut Arena, index: NodeIndex, new_size: u32) {
        let node = arena.get_mut(index);
        let old_size = node.size;
        node.size = new_size;

        self.total_size = self.total_size - u64::from(old_size) + u64::from(new_size);
    }

    /// Iterate the resting orders oldest-first.
    pub fn orders_in_fifo<'a>(&self, arena: &'a Arena) -> FifoOrders<'a> {
        FifoOrders {
            arena,
            cursor: self.head,
        }
    }
}

/// Iterator over a level's orders in time-priority order.
pub struct FifoOrders<'a> {
    arena: &'a Arena,
    cursor: NodeIndex,
}

impl<'a> FifoOrders<'a> {
    /// Iterator over no orders, for levels that do not exist.
    pub(crate) fn empty(arena: &'a Arena) -> Self {
        Self {
            arena,
            cursor: NULL_INDEX,
        }
    }
}

impl<'a> Iterator for FifoOrders<'a> {
    type Item = &'a crate::arena::OrderNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NULL_INDEX {
            return None;
        }
        let node = self.arena.get(self.cursor);
        self.cursor = node.next;
        Some(node)
    }
}
