// src/lib.rs
pub mod cli;
pub mod core;
pub mod leads;
pub mod search;
pub mod utils;
pub mod vendors;
pub mod web;

pub use web::start_web_server;
