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

//! Hash functions used to place virtual nodes and keys on the ring.
//!
//! A `RingHasher` is a pure function from bytes to a 64-bit digest. Each call
//! owns its hashing state, so a single hasher can be shared by any number of
//! threads without extra locking. Every `BuildHasher` is a `RingHasher`, which
//! makes builders such as `fnv::FnvBuildHasher` usable as-is.

use {
    siphasher::sip::SipHasher,
    std::hash::{BuildHasher, Hasher},
};

/// Error reported by a hash function that failed to consume its input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HashError {
    message: String,
}

impl HashError {
    pub fn new(message: impl Into<String>) -> Self {
        HashError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Produces the ring position of a byte sequence.
///
/// Implementations must be deterministic: the same bytes always yield the same
/// digest for the lifetime of a ring, otherwise lookups and removals stop
/// agreeing with the positions recorded at insertion time.
pub trait RingHasher: Send + Sync {
    fn digest(&self, bytes: &[u8]) -> Result<u64, HashError>;
}

impl<B> RingHasher for B
where
    B: BuildHasher + Send + Sync,
{
    #[inline]
    fn digest(&self, bytes: &[u8]) -> Result<u64, HashError> {
        let mut hasher = self.build_hasher();
        hasher.write(bytes);
        Ok(hasher.finish())
    }
}

/// Default hash builder. Based on `SipHasher` with zero keys, which produces
/// 64-bit hashes that are stable across processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHashBuilder;

impl BuildHasher for DefaultHashBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new()
    }
}

/// Label hashed to obtain the position of virtual node `ordinal` of `node`.
#[inline]
pub fn virtual_node_label(node: &str, ordinal: u32) -> String {
    format!("{node}:{ordinal}")
}
