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

/// Sorted ring positions paired with the reverse mapping from each position to
/// the node that owns it.
///
/// Both representations are private and only change through `insert_node`,
/// `remove_node` and `clear`, which keep the domain of `owners` equal to the
/// contents of `positions`.
#[derive(Debug, Default)]
pub(crate) struct VirtualNodeIndex {
    positions: Vec<u64>,
    owners: HashMap<u64, String>,
}

impl VirtualNodeIndex {
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Places `node` on every position in `positions`. A position already owned
    /// by another node is taken over by `node`.
    pub fn insert_node(&mut self, node: &str, positions: &BTreeSet<u64>) {
        for &position in positions {
            if self.owners.insert(position, node.to_owned()).is_none() {
                self.positions.push(position);
            }
        }

        self.positions.sort_unstable();
    }

    /// Takes `node` off the positions in `positions` that it still owns and
    /// rebuilds the sorted index. A position another node also generated is
    /// handed to the node `claimant` names for it; the rest leave the ring.
    /// Returns how many positions left the ring.
    pub fn remove_node<'a, F>(
        &mut self,
        node: &str,
        positions: &BTreeSet<u64>,
        claimant: F,
    ) -> usize
    where
        F: Fn(u64) -> Option<&'a str>,
    {
        let mut removed = 0;

        for &position in positions {
            if !self.owners.get(&position).is_some_and(|owner| owner == node) {
                continue;
            }

            match claimant(position) {
                Some(other) => {
                    self.owners.insert(position, other.to_owned());
                }
                None => {
                    self.owners.remove(&position);
                    removed += 1;
                }
            }
        }

        self.rebuild();

        removed
    }

    /// Returns the owner of the first position at or after `digest`, wrapping
    /// around to the lowest position, or `None` if the index is empty.
    pub fn successor(&self, digest: u64) -> Option<&str> {
        if self.is_empty() {
            return None;
        }

        let index = match self.positions.binary_search(&digest) {
            Err(index) => index,
            Ok(index) => index,
        };

        let index = if index == self.positions.len() { 0 } else { index };

        self.owners.get(&self.positions[index]).map(String::as_str)
    }

    /// Iterates over `(position, owner)` pairs in ascending position order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.positions.iter().filter_map(move |position| {
            self.owners
                .get(position)
                .map(|owner| (*position, owner.as_str()))
        })
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.owners.clear();
    }

    fn rebuild(&mut self) {
        let mut positions: Vec<u64> = self.owners.keys().copied().collect();
        positions.sort_unstable();
        self.positions = positions;
    }
}
