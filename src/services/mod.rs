pub mod consistency;
pub mod directory;

pub use consistency::ConsistencyService;
pub use directory::DirectoryService;
