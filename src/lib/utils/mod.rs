//! Shortcuts to the helpers most commands need.
//!
//! Everything here lives under `crate::core`; new code may import from
//! `core::prelude` directly.

pub use crate::core::concurrency::determine_allowed_cpus;
pub use crate::core::errors::is_broken_pipe;
pub use crate::core::fs::{is_gzipped, make_parent_dirs, with_suffix};
pub use crate::core::io::{get_raw_writer, get_reader, get_writer};
