// src/db/mod.rs
//
// Database module

pub mod connection;

pub use connection::{create_test_connection, open_connection};
