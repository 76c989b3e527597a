//! Shared engine handles
//!
//! Engines are plain `&mut self` state machines. Hosts that serve them from
//! several threads wrap each one in a [`Shared`] handle: mutating calls take
//! the write lock so only one runs at a time, queries take the read lock and
//! see a consistent snapshot.

use parking_lot::RwLock;
use std::sync::Arc;

pub type Shared<T> = Arc<RwLock<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}
