//! Smartcab Core - Driving vocabulary, collaborator traits, and shared functionality
//!
//! This crate provides the types shared by the learning agent and the
//! simulated world it drives in.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;
pub mod util;
pub mod world;

pub use error::{Result, SmartcabError};
pub use types::*;
pub use world::{Environment, RoutePlanner};
