//! Node stores - one ID-to-node map per side of the sync boundary
//!
//! The producer store is written only by producer tasks (under the sync
//! context's lock); the consumer store is written only by the render thread
//! while applying drained commands. The side is a type parameter so the two
//! instances cannot be mixed up at a call site.
//!
//! Lookups of absent IDs return `None`, never panic: commands treat a missing
//! target as "already destroyed, skip".

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use aria_core::NodeId;

use crate::node::Node;

mod sealed {
    pub trait Sealed {}
}

/// Marker trait for a store side
pub trait Side: sealed::Sealed + 'static {
    /// Side name used in logs
    const NAME: &'static str;
}

/// Marker: the store owned by the scripting VM side
pub enum ProducerSide {}

/// Marker: the store owned by the render thread
pub enum ConsumerSide {}

impl sealed::Sealed for ProducerSide {}
impl sealed::Sealed for ConsumerSide {}

impl Side for ProducerSide {
    const NAME: &'static str = "producer";
}

impl Side for ConsumerSide {
    const NAME: &'static str = "consumer";
}

/// ID-to-node registry for one side of the boundary.
///
/// Because IDs are never reused, the store also remembers every ID it has
/// unregistered. That is what lets command application tell "not created yet"
/// apart from "already destroyed" when a stale command arrives.
pub struct NodeStore<S: Side> {
    nodes: HashMap<NodeId, Node>,
    retired: HashSet<NodeId>,
    _side: PhantomData<S>,
}

/// The store mutated by producer tasks
pub type ProducerStore = NodeStore<ProducerSide>;

/// The store mutated by the render thread
pub type ConsumerStore = NodeStore<ConsumerSide>;

impl<S: Side> NodeStore<S> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            retired: HashSet::new(),
            _side: PhantomData,
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store holds no live nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Register a node under its ID.
    ///
    /// Returns `false` (and leaves the store unchanged) if the ID is already
    /// live or already retired; IDs are single-use.
    pub fn register(&mut self, node: Node) -> bool {
        let id = node.id;
        if self.retired.contains(&id) {
            log::debug!("{} store: dropping re-register of retired {}", S::NAME, id);
            return false;
        }
        if self.nodes.contains_key(&id) {
            log::warn!("{} store: duplicate register of live {}", S::NAME, id);
            return false;
        }
        self.nodes.insert(id, node);
        true
    }

    /// Look up a node
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up a node mutably
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Whether the ID is currently live
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Whether the ID was live once and has been unregistered since
    pub fn is_retired(&self, id: NodeId) -> bool {
        self.retired.contains(&id)
    }

    /// Remove a node, retiring its ID forever.
    ///
    /// Returns the removed node, or `None` if the ID was not live.
    pub fn unregister(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        self.retired.insert(id);
        Some(node)
    }

    /// Iterate over all live nodes
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate over all live IDs
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }
}

impl<S: Side> Default for NodeStore<S> {
    fn default() -> Self {
        Self::new()
    }
}
