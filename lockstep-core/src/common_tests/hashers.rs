//! Deterministic hashers for tests.
//!
//! `IdentityBuildHasher` makes a set's chain order follow the element order,
//! `ModuloBuildHasher` forces key collisions.

use std::hash::{BuildHasherDefault, Hasher};

/// Hasher that passes integers through unchanged.
///
/// Signed integers have their sign bit flipped so that key order matches
/// numeric order.
///
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityHasher {
    hash: u64,
}

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.hash = (self.hash << 8) | u64::from(*byte);
        }
    }

    fn write_u32(&mut self, n: u32) {
        self.hash = u64::from(n);
    }

    fn write_u64(&mut self, n: u64) {
        self.hash = n;
    }

    fn write_usize(&mut self, n: usize) {
        self.hash = n as u64;
    }

    fn write_i32(&mut self, n: i32) {
        self.write_i64(i64::from(n));
    }

    fn write_i64(&mut self, n: i64) {
        self.hash = (n as u64) ^ (1 << 63);
    }
}

pub type IdentityBuildHasher = BuildHasherDefault<IdentityHasher>;

/// Hasher that folds every value into `M` buckets, so `x` and `x + M` share a
/// key.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuloHasher<const M: u64> {
    inner: IdentityHasher,
}

impl<const M: u64> Hasher for ModuloHasher<M> {
    fn finish(&self) -> u64 {
        self.inner.finish() % M
    }

    fn write(&mut self, bytes: &[u8]) {
        self.inner.write(bytes);
    }

    fn write_u32(&mut self, n: u32) {
        self.inner.write_u32(n);
    }

    fn write_u64(&mut self, n: u64) {
        self.inner.write_u64(n);
    }

    fn write_usize(&mut self, n: usize) {
        self.inner.write_usize(n);
    }

    fn write_i32(&mut self, n: i32) {
        self.inner.write_i32(n);
    }

    fn write_i64(&mut self, n: i64) {
        self.inner.write_i64(n);
    }
}

pub type ModuloBuildHasher<const M: u64> = BuildHasherDefault<ModuloHasher<M>>;
