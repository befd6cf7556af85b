//! cdpdocs-core
//!
//! Domain types, the shared error enum, the engine traits that the text,
//! vector and hybrid crates implement, configuration, and the response cache.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod cache;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
