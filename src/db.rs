// src/db.rs

pub mod backend;
pub use backend::{Backend, NewAccount, ProfileSubscription};
pub mod memory_backend;
pub use memory_backend::MemoryBackend;
pub mod pg_backend;
pub use pg_backend::PgBackend;
pub mod slot_storage;
pub use slot_storage::{FileSlotStorage, MemorySlotStorage, SlotStorage, StoreError};
pub mod local_store;
pub use local_store::{LocalRecord, LocalStore, ScopedStores};
