#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod config;
pub mod core;
pub mod engine;
pub mod index;
pub mod matcher;
pub mod parse;
pub mod review;
pub mod stats;
pub mod store;
