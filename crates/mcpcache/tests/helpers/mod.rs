//! Test helpers para mcpcache.

#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod stores;

pub use fixtures::*;
pub use stores::{FlakyStore, LazyConnectStore, SlowStore};
