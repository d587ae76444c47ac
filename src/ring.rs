// MIT License

// Copyright (c) 2016 Jerome Froelich

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use {
    crate::{
        config::RingConfig,
        hasher::virtual_node_label,
        index::VirtualNodeIndex,
        registry::NodeRegistry,
        DefaultHashBuilder,
        Error,
        RingBuilder,
        RingHasher,
    },
    parking_lot::RwLock,
    std::{collections::BTreeSet, fmt},
    tracing::{debug, trace},
};

/// Everything that changes when nodes join or leave. Guarded as one unit so
/// readers never see the index and the registry disagree.
#[derive(Debug, Default)]
struct RingState {
    index: VirtualNodeIndex,
    registry: NodeRegistry,
}

/// Consistent hash ring with virtual nodes.
///
/// Membership changes take an exclusive lock for their whole mutation, lookups
/// take a shared one, so a `Ring` can be shared between threads behind an `Arc`
/// without any outer synchronization.
pub struct Ring<S = DefaultHashBuilder> {
    config: RingConfig,
    hasher: S,
    state: RwLock<RingState>,
}

impl Default for Ring {
    fn default() -> Self {
        Ring::from_parts(RingConfig::default(), DefaultHashBuilder)
    }
}

impl Ring {
    /// Create a new `Ring` with the default replica count and hash function.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn builder() -> RingBuilder {
        RingBuilder::new()
    }
}

impl<S: RingHasher> Ring<S> {
    /// Creates an empty `Ring` with the default replica count which will use
    /// the given hash function.
    pub fn with_hasher(hasher: S) -> Self {
        Ring::from_parts(RingConfig::default(), hasher)
    }

    /// Creates an empty `Ring` from an explicit configuration, rejecting
    /// invalid values.
    pub fn from_config(config: RingConfig, hasher: S) -> Result<Self, Error> {
        RingBuilder::new().config(config).hasher(hasher).build()
    }

    pub(crate) fn from_parts(config: RingConfig, hasher: S) -> Self {
        Ring {
            config,
            hasher,
            state: RwLock::new(RingState::default()),
        }
    }

    /// Number of virtual nodes generated per node.
    #[inline]
    pub fn replicas(&self) -> u32 {
        self.config.replicas
    }

    /// Get the number of nodes in the ring.
    pub fn len(&self) -> usize {
        self.state.read().registry.len()
    }

    /// Same as `len()`, named to pair with `vnode_count()`.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.len()
    }

    /// Returns true if the ring has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of positions (virtual nodes) on the ring.
    pub fn vnode_count(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.state.read().registry.contains(node)
    }

    /// Returns the keys of all nodes in the ring, sorted.
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .state
            .read()
            .registry
            .keys()
            .map(str::to_owned)
            .collect();
        nodes.sort_unstable();
        nodes
    }

    /// Returns the ring positions assigned to `node`, ascending.
    pub fn virtual_nodes(&self, node: &str) -> Result<Vec<u64>, Error> {
        self.state
            .read()
            .registry
            .positions(node)
            .map(|positions| positions.iter().copied().collect())
            .ok_or(Error::NodeNotFound)
    }

    /// Hashes `key` and returns its position on the ring.
    #[inline]
    pub fn digest(&self, key: impl AsRef<[u8]>) -> Result<u64, Error> {
        self.hasher
            .digest(key.as_ref())
            .map_err(|source| Error::Hash {
                context: "cannot hash key",
                source,
            })
    }

    /// Adds `node` to the ring, placing `replicas()` virtual nodes for it.
    ///
    /// Returns `Error::EmptyNodeKey` for an empty key, `Error::DuplicateNode`
    /// if the ring already contains `node`, or `Error::Hash` if a virtual node
    /// could not be hashed. The ring is left unchanged on error.
    pub fn add_node(&self, node: &str) -> Result<(), Error> {
        if node.is_empty() {
            return Err(Error::EmptyNodeKey);
        }

        // Hashing is stateless, so positions are computed before the write lock
        // is taken and the mutation below cannot fail halfway.
        let positions = self.virtual_node_positions(node)?;

        let mut state = self.state.write();

        if state.registry.contains(node) {
            return Err(Error::DuplicateNode);
        }

        state.index.insert_node(node, &positions);
        state.registry.register(node.to_owned(), positions);

        debug!(
            node,
            replicas = self.config.replicas,
            vnodes = state.index.len(),
            "added node to ring"
        );

        Ok(())
    }

    /// Removes `node` and all of its virtual nodes from the ring. Returns
    /// `Error::NodeNotFound` if the ring does not contain `node`.
    ///
    /// A position `node` had taken over from another live node goes back to
    /// that node instead of leaving the ring.
    pub fn delete_node(&self, node: &str) -> Result<(), Error> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let Some(positions) = state.registry.unregister(node) else {
            return Err(Error::NodeNotFound);
        };

        let registry = &state.registry;
        let removed = state
            .index
            .remove_node(node, &positions, |position| registry.claimant(position));

        debug!(
            node,
            removed,
            vnodes = state.index.len(),
            "removed node from ring"
        );

        Ok(())
    }

    /// Returns the node responsible for `key`, or `Error::NoNodes` if the ring
    /// is empty.
    pub fn get_node(&self, key: impl AsRef<[u8]>) -> Result<String, Error> {
        let digest = self.digest(key)?;

        self.get_node_by_digest(digest)
    }

    /// Returns the node owning the first ring position at or after `digest`,
    /// wrapping around past the highest position.
    pub fn get_node_by_digest(&self, digest: u64) -> Result<String, Error> {
        let state = self.state.read();

        let node = state.index.successor(digest).ok_or(Error::NoNodes)?;
        trace!(digest, node, "resolved ring position");

        Ok(node.to_owned())
    }

    /// Removes every node from the ring.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.index.clear();
        state.registry.clear();

        debug!("cleared ring");
    }

    fn virtual_node_positions(&self, node: &str) -> Result<BTreeSet<u64>, Error> {
        (0..self.config.replicas)
            .map(|ordinal| {
                self.hasher
                    .digest(virtual_node_label(node, ordinal).as_bytes())
                    .map_err(|source| Error::Hash {
                        context: "cannot add node",
                        source,
                    })
            })
            .collect()
    }
}

impl<S> fmt::Debug for Ring<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();

        f.debug_struct("Ring")
            .field("replicas", &self.config.replicas)
            .field("nodes", &state.registry.len())
            .field("vnodes", &state.index.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::HashError,
        pretty_assertions::assert_eq,
    };

    /// Hashes like the default builder but refuses labels of the "poison" node.
    struct PoisonHasher;

    impl RingHasher for PoisonHasher {
        fn digest(&self, bytes: &[u8]) -> Result<u64, HashError> {
            if bytes.starts_with(b"poison") {
                return Err(HashError::new("write failed"));
            }

            DefaultHashBuilder.digest(bytes)
        }
    }

    /// Places "a:1" and "b:0" on the same position.
    struct CollidingHasher;

    impl RingHasher for CollidingHasher {
        fn digest(&self, bytes: &[u8]) -> Result<u64, HashError> {
            Ok(match bytes {
                b"a:0" => 10,
                b"a:1" | b"b:0" => 20,
                b"b:1" => 30,
                _ => 15,
            })
        }
    }

    fn ring(replicas: u32) -> Ring {
        Ring::builder().replicas(replicas).build().unwrap()
    }

    #[test]
    fn add_and_delete_nodes() {
        let ring = ring(10);

        assert_eq!(ring.len(), 0);
        assert!(ring.is_empty());

        ring.add_node("node1").unwrap();
        ring.add_node("node2").unwrap();
        ring.add_node("node3").unwrap();
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.node_count(), 3);
        assert_eq!(ring.vnode_count(), 30);
        assert!(!ring.is_empty());
        assert!(ring.contains("node2"));

        ring.delete_node("node2").unwrap();
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.node_count(), 2);
        assert_eq!(ring.vnode_count(), 20);
        assert!(!ring.contains("node2"));
        assert_eq!(ring.nodes(), vec!["node1".to_owned(), "node3".to_owned()]);
    }

    #[test]
    fn get_node() {
        let ring = ring(50);

        assert_eq!(ring.get_node("foo"), Err(Error::NoNodes));

        ring.add_node("node1").unwrap();
        for key in ["foo", "bar", "baz"] {
            assert_eq!(ring.get_node(key).unwrap(), "node1");
        }

        ring.add_node("node2").unwrap();
        let owner = ring.get_node("foo").unwrap();
        assert!(owner == "node1" || owner == "node2");
        for _ in 0..10 {
            assert_eq!(ring.get_node("foo").unwrap(), owner);
        }

        // Byte keys and string keys with the same bytes agree.
        assert_eq!(ring.get_node(b"foo").unwrap(), owner);
    }

    #[test]
    fn lookup_follows_successor_position() {
        let ring = ring(20);
        ring.add_node("node1").unwrap();
        ring.add_node("node2").unwrap();

        let mut positions: Vec<(u64, &str)> = Vec::new();
        for node in ["node1", "node2"] {
            for position in ring.virtual_nodes(node).unwrap() {
                positions.push((position, node));
            }
        }
        positions.sort_unstable();

        for &(position, node) in &positions {
            assert_eq!(ring.get_node_by_digest(position).unwrap(), node);
        }

        let (first, first_owner) = positions[0];
        let (last, _) = positions[positions.len() - 1];
        if first > 0 {
            assert_eq!(ring.get_node_by_digest(first - 1).unwrap(), first_owner);
        }
        if last < u64::MAX {
            assert_eq!(ring.get_node_by_digest(last + 1).unwrap(), first_owner);
        }

        let digest = ring.digest("some key").unwrap();
        assert_eq!(
            ring.get_node("some key").unwrap(),
            ring.get_node_by_digest(digest).unwrap()
        );
    }

    #[test]
    fn virtual_nodes_hash_node_labels() {
        let ring = ring(4);
        ring.add_node("node1").unwrap();

        let mut expected: Vec<u64> = (0..4)
            .map(|i| DefaultHashBuilder.digest(format!("node1:{i}").as_bytes()).unwrap())
            .collect();
        expected.sort_unstable();

        assert_eq!(ring.virtual_nodes("node1").unwrap(), expected);
        assert_eq!(ring.virtual_nodes("node2"), Err(Error::NodeNotFound));
    }

    #[test]
    fn duplicate_node_rejected() {
        let ring = ring(10);
        ring.add_node("node1").unwrap();
        let positions = ring.virtual_nodes("node1").unwrap();

        assert_eq!(ring.add_node("node1"), Err(Error::DuplicateNode));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.vnode_count(), 10);
        assert_eq!(ring.virtual_nodes("node1").unwrap(), positions);
    }

    #[test]
    fn empty_node_key_rejected() {
        let ring = ring(10);

        assert_eq!(ring.add_node(""), Err(Error::EmptyNodeKey));
        assert!(ring.is_empty());
        assert_eq!(ring.vnode_count(), 0);
        assert!(!ring.contains(""));
    }

    #[test]
    fn deleting_node_returns_shared_position() {
        let ring = Ring::builder()
            .replicas(2)
            .hasher(CollidingHasher)
            .build()
            .unwrap();
        ring.add_node("a").unwrap();
        ring.add_node("b").unwrap();

        assert_eq!(ring.vnode_count(), 3);
        assert_eq!(ring.get_node_by_digest(20).unwrap(), "b");

        ring.delete_node("b").unwrap();

        assert_eq!(ring.vnode_count(), 2);
        assert_eq!(ring.virtual_nodes("a").unwrap(), vec![10, 20]);
        assert_eq!(ring.get_node_by_digest(20).unwrap(), "a");
        assert_eq!(ring.get_node_by_digest(25).unwrap(), "a");

        // Removing the node that lost the position keeps the winner in place.
        ring.add_node("b").unwrap();
        ring.delete_node("a").unwrap();
        assert_eq!(ring.virtual_nodes("b").unwrap(), vec![20, 30]);
        assert_eq!(ring.vnode_count(), 2);
        assert_eq!(ring.get_node_by_digest(20).unwrap(), "b");
    }

    #[test]
    fn delete_unknown_node() {
        let ring = ring(10);
        assert_eq!(ring.delete_node("node1"), Err(Error::NodeNotFound));

        ring.add_node("node1").unwrap();
        assert_eq!(ring.delete_node("node2"), Err(Error::NodeNotFound));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.vnode_count(), 10);
    }

    #[test]
    fn hash_failure_leaves_ring_untouched() {
        let ring = Ring::builder()
            .replicas(10)
            .hasher(PoisonHasher)
            .build()
            .unwrap();
        ring.add_node("node1").unwrap();

        let err = ring.add_node("poison").unwrap_err();
        assert_eq!(
            err,
            Error::Hash {
                context: "cannot add node",
                source: HashError::new("write failed"),
            }
        );
        assert_eq!(err.to_string(), "cannot add node: write failed");

        assert_eq!(ring.len(), 1);
        assert_eq!(ring.vnode_count(), 10);
        assert!(!ring.contains("poison"));

        let err = ring.get_node("poisoned key").unwrap_err();
        assert_eq!(err.to_string(), "cannot hash key: write failed");
    }

    #[test]
    fn round_trip_and_clear() {
        let ring = ring(25);
        ring.add_node("node1").unwrap();
        ring.delete_node("node1").unwrap();

        assert_eq!(ring.len(), 0);
        assert_eq!(ring.vnode_count(), 0);
        assert_eq!(ring.get_node("foo"), Err(Error::NoNodes));

        ring.add_node("node1").unwrap();
        ring.add_node("node2").unwrap();
        ring.clear();

        assert!(ring.is_empty());
        assert_eq!(ring.vnode_count(), 0);
        assert!(ring.nodes().is_empty());

        // Cleared rings accept the same nodes again.
        ring.add_node("node1").unwrap();
        assert_eq!(ring.vnode_count(), 25);
    }

    #[test]
    fn debug_reports_counts() {
        let ring = ring(3);
        ring.add_node("node1").unwrap();

        assert_eq!(format!("{ring:?}"), "Ring { replicas: 3, nodes: 1, vnodes: 3, .. }");
    }
}
