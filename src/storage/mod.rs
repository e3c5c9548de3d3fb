mod in_memory;
mod store;

pub use in_memory::InMemoryStorage;
pub use store::Storage;
