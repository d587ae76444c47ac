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

//! A thread-safe implementation of consistent hashing with virtual nodes, as
//! described in [Consistent Hashing and Random Trees: Distributed Caching
//! Protocols for Relieving Hot Spots on the World Wide Web](https://www.akamai.com/es/es/multimedia/documents/technical-publication/consistent-hashing-and-random-trees-distributed-caching-protocols-for-relieving-hot-spots-on-the-world-wide-web-technical-publication.pdf).
//!
//! Clients use the `Ring` struct to route keys to a dynamic set of named nodes.
//! `Ring`'s API consists of three methods: `add_node`, `delete_node`, and
//! `get_node` for adding a node to the ring, removing a node from the ring, and
//! getting the node responsible for the provided key.
//!
//! Every node is placed on the ring `replicas` times, at the hashes of the
//! labels `"{node}:0"` to `"{node}:{replicas - 1}"`. A key belongs to the node
//! owning the first position at or after the key's hash, wrapping around past
//! the highest position. Adding or removing a node therefore only moves the
//! keys that land on that node's positions.
//!
//! ## Example
//!
//! ``` rust
//! use {std::sync::Arc, vnode_ring::Ring};
//!
//! let ring = Arc::new(Ring::builder().replicas(256).build().unwrap());
//!
//! ring.add_node("10.0.0.1:6379").unwrap();
//! ring.add_node("10.0.0.2:6379").unwrap();
//! ring.add_node("10.0.0.3:6379").unwrap();
//!
//! let owner = ring.get_node("user:1042").unwrap();
//! assert!(ring.contains(&owner));
//!
//! // Lookups are stable until membership changes.
//! assert_eq!(ring.get_node("user:1042").unwrap(), owner);
//!
//! ring.delete_node(&owner).unwrap();
//! assert_ne!(ring.get_node("user:1042").unwrap(), owner);
//! ```

pub use {
    config::{RingBuilder, RingConfig, DEFAULT_REPLICAS},
    hasher::{virtual_node_label, DefaultHashBuilder, HashError, RingHasher},
    ring::Ring,
};

pub mod config;
pub mod hasher;
mod index;
mod registry;
mod ring;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("No nodes available")]
    NoNodes,

    #[error("Node not found")]
    NodeNotFound,

    #[error("Duplicate node")]
    DuplicateNode,

    #[error("Empty node key")]
    EmptyNodeKey,

    /// The hash function failed while computing a digest.
    #[error("{context}: {source}")]
    Hash {
        context: &'static str,
        source: HashError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
