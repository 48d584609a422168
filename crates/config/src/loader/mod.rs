//! Configuration loader for files, environment variables and defaults.
//!
//! Responsibilities:
//! - Provide a builder-pattern `Loader` that resolves a destination structure.
//! - Apply declared defaults to zero-valued fields.
//! - Define the error taxonomy shared by every stage of loading.
//!
//! Does NOT handle:
//! - Locating or parsing config files (see `provider`).
//! - Converting loosely-typed values (see `decode`).
//!
//! Invariants / Assumptions:
//! - Environment variables take precedence over file values, which take
//!   precedence over declared defaults.
//! - `load_dotenv()` must be called explicitly to enable `.env` file loading.

mod builder;
mod defaults;
mod error;
mod shape;

pub use builder::Loader;
pub use defaults::apply_defaults;
pub use error::{ConfigError, ParseError};
