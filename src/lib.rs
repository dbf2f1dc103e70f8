// src/lib.rs

pub mod config;
pub mod error;
pub mod grading;
pub mod handlers;
pub mod import;
pub mod live;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;
pub mod timer;
pub mod utils;

pub use routes::create_router;
