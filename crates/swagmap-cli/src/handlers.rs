//! Command handlers for CLI subcommands
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

mod completions;
mod convert;
mod models;
mod utils;
mod validate;

pub use completions::handle_completions;
pub use convert::{handle_marshal, handle_unmarshal};
pub use models::handle_models;
pub use validate::handle_validate;
