#![doc = include_str!("../README.md")]

pub mod actions;
pub mod api;
pub mod cli;
pub mod engine;
pub mod error;
pub mod extract;
pub mod policy;
pub mod services;
pub mod state;
pub mod types;
pub mod verify;

pub use engine::*;
pub use error::*;
pub use services::*;
pub use types::*;
