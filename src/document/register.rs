//! Last-writer-wins registers
//!
//! Every replicated field of an entry is a register carrying a Lamport stamp.
//! Joining two registers keeps the greater `(stamp, value)` pair, which makes the
//! join commutative, associative and idempotent: replicas that have seen the
//! same writes hold the same value regardless of delivery order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Stamp: Lamport counter plus the authoring replica, totally ordered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub counter: u64,
    pub replica: String,
}

impl Stamp {
    pub fn new(counter: u64, replica: impl Into<String>) -> Self {
        Self {
            counter,
            replica: replica.into(),
        }
    }
}

/// A single last-writer-wins value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register<T> {
    value: T,
    stamp: Stamp,
}

impl<T: Clone + Ord> Register<T> {
    pub fn new(value: T, stamp: Stamp) -> Self {
        Self { value, stamp }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn stamp(&self) -> &Stamp {
        &self.stamp
    }

    /// Record a local write. Returns false if the stamp is older than the
    /// current one, in which case the write is lost to the newer value.
    pub fn set(&mut self, value: T, stamp: Stamp) -> bool {
        self.join(&Register::new(value, stamp))
    }

    /// Join another replica's register into this one. Returns true when the
    /// local value or stamp changed.
    pub fn join(&mut self, other: &Register<T>) -> bool {
        let replace = match other.stamp.cmp(&self.stamp) {
            Ordering::Greater => true,
            Ordering::Less => false,
            // Equal stamps only differ in value if a replica reused a counter;
            // break the tie on the value so every replica picks the same one.
            Ordering::Equal => other.value > self.value,
        };
        if replace {
            self.value = other.value.clone();
            self.stamp = other.stamp.clone();
        }
        replace
    }
}
