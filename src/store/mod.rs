//! Document store access: the querier contract and an in-memory store.

pub mod memory;
pub mod querier;

pub use memory::InMemoryStore;
pub use querier::{Querier, StoreEvent, StoreListener};
