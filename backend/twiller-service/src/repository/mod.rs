mod memory;
mod postgres;
mod r#trait;

pub use memory::MemoryRepository;
pub use postgres::{connect, PostgresRepository};
pub use r#trait::Repository;
