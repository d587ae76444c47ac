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

use std::collections::{BTreeSet, HashMap};

/// Tracks the ring positions each live node was assigned when it was added,
/// so removal never has to rehash the node's labels.
#[derive(Debug, Default)]
pub(crate) struct NodeRegistry {
    nodes: HashMap<String, BTreeSet<u64>>,
}

impl NodeRegistry {
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    /// Records `positions` against `node`, replacing anything recorded before.
    pub fn register(&mut self, node: String, positions: BTreeSet<u64>) {
        self.nodes.insert(node, positions);
    }

    /// Forgets `node` and hands back the positions it owned.
    pub fn unregister(&mut self, node: &str) -> Option<BTreeSet<u64>> {
        self.nodes.remove(node)
    }

    pub fn positions(&self, node: &str) -> Option<&BTreeSet<u64>> {
        self.nodes.get(node)
    }

    /// Returns the registered node that generated `position`. When several did,
    /// the lowest node key wins so the choice does not depend on add order.
    pub fn claimant(&self, position: u64) -> Option<&str> {
        self.nodes
            .iter()
            .filter(|(_, positions)| positions.contains(&position))
            .map(|(node, _)| node.as_str())
            .min()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
