//! Unique identifier generation for scene nodes and producer tasks

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a scene node.
///
/// IDs are handed out once at creation from a monotonic counter, are never
/// reused, and never change. The same `NodeId` names the same logical entity
/// in the producer store and in the consumer store; it is the only thing that
/// ever crosses the thread boundary to refer to a node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// The null node. Used as a placeholder target, e.g. a material sampler
    /// whose texture has been destroyed.
    pub const NULL: NodeId = NodeId(0);

    /// Create an ID from a raw value
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Check if this is the null node
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "NodeId(null)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "node#null")
        } else {
            write!(f, "node#{}", self.0)
        }
    }
}

/// Identity of a registered producer task (one concurrently scheduled script).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Create an ID from a raw value
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Thread-safe allocator for node IDs.
///
/// Starts at 1 so that 0 stays reserved for [`NodeId::NULL`]. IDs are never
/// recycled; a destroyed node's ID stays retired forever.
pub struct NodeIdAllocator {
    next: AtomicU64,
}

impl NodeIdAllocator {
    /// Create a new allocator
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next unique node ID
    pub fn next(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe allocator for task IDs.
pub struct TaskIdAllocator {
    next: AtomicU64,
}

impl TaskIdAllocator {
    /// Create a new allocator
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next unique task ID
    pub fn next(&self) -> TaskId {
        TaskId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TaskIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_monotonic() {
        let alloc = NodeIdAllocator::new();
        let a = alloc.next();
        let b = alloc.next();
        assert!(a < b);
        assert!(!a.is_null());
    }

    #[test]
    fn test_null_is_never_allocated() {
        let alloc = NodeIdAllocator::new();
        for _ in 0..100 {
            assert!(!alloc.next().is_null());
        }
    }

    #[test]
    fn test_task_ids_are_unique() {
        let alloc = TaskIdAllocator::new();
        let a = alloc.next();
        let b = alloc.next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeId::from_raw(7).to_string(), "node#7");
        assert_eq!(NodeId::NULL.to_string(), "node#null");
        assert_eq!(TaskId::from_raw(3).to_string(), "task#3");
    }
}
