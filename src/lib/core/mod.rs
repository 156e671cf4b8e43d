pub mod concurrency;
pub mod error;
pub mod errors;
pub mod fs;
pub mod io;
pub mod special;

pub mod prelude {
    pub use super::concurrency::determine_allowed_cpus;
    pub use super::error::{DartError, Result};
    pub use super::errors::is_broken_pipe;
    pub use super::fs::{is_gzipped, make_parent_dirs, with_suffix};
    pub use super::io::{get_raw_writer, get_reader, get_writer};
    pub use super::special::{chi_square_cdf, ln_gamma, regularized_gamma_lower};
}
