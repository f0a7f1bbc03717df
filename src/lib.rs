// src/lib.rs
pub mod api;
pub mod banner;
pub mod collector;
pub mod config;
pub mod errors;
pub mod models;
pub mod normalizer;
pub mod render;
pub mod session;
pub mod transport;
