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

//! Construction-time configuration for a [`Ring`].
//!
//! Configuration is an immutable record built once before the ring exists.
//! [`RingConfig`] holds the serializable knobs so applications can embed it in
//! their own configuration files; [`RingBuilder`] combines it with a hash
//! function and validates both before handing out a ring.

use {
    crate::{DefaultHashBuilder, Error, Ring, RingHasher},
    serde::{Deserialize, Serialize},
};

/// Number of virtual nodes generated per node unless configured otherwise.
pub const DEFAULT_REPLICAS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Virtual nodes generated for every node added to the ring.
    pub replicas: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        RingConfig {
            replicas: DEFAULT_REPLICAS,
        }
    }
}

impl RingConfig {
    pub fn new(replicas: u32) -> Self {
        RingConfig { replicas }
    }

    /// Rejects configurations that would produce a ring no key can ever be
    /// routed through.
    pub fn validate(&self) -> Result<(), Error> {
        if self.replicas == 0 {
            return Err(Error::InvalidConfig(
                "replica count must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`Ring`].
///
/// ```
/// use vnode_ring::{DefaultHashBuilder, RingBuilder};
///
/// let ring = RingBuilder::new()
///     .replicas(128)
///     .hasher(DefaultHashBuilder)
///     .build()
///     .unwrap();
///
/// assert_eq!(ring.replicas(), 128);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuilder<S = DefaultHashBuilder> {
    config: RingConfig,
    hasher: S,
}

impl Default for RingBuilder {
    fn default() -> Self {
        RingBuilder {
            config: RingConfig::default(),
            hasher: DefaultHashBuilder,
        }
    }
}

impl RingBuilder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<S: RingHasher> RingBuilder<S> {
    /// Sets the number of virtual nodes generated per node.
    pub fn replicas(mut self, replicas: u32) -> Self {
        self.config.replicas = replicas;
        self
    }

    /// Replaces every configurable knob with the values in `config`.
    pub fn config(mut self, config: RingConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the hash function used for both virtual nodes and lookup keys.
    pub fn hasher<H: RingHasher>(self, hasher: H) -> RingBuilder<H> {
        RingBuilder {
            config: self.config,
            hasher,
        }
    }

    /// Validates the configuration and returns an empty ring.
    pub fn build(self) -> Result<Ring<S>, Error> {
        self.config.validate()?;

        Ok(Ring::from_parts(self.config, self.hasher))
    }
}
