pub mod journal;
pub mod memory;

pub use journal::FileBackedOutbox;
pub use memory::InMemoryOutbox;
