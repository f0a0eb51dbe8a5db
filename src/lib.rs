pub mod fs;
pub mod memory;
pub mod models;
pub mod server;
pub mod state;
pub mod storage;
pub mod store;
