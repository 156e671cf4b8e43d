pub mod assign;
pub mod common;
pub mod export;
pub mod filter;
pub mod simulate;
pub mod stats;

pub use assign::{run_assign, AssignArgs};
pub use export::{run_export, ExportArgs};
pub use filter::{run_filter, FilterArgs};
pub use simulate::{run_simulate, SimulateArgs};
pub use stats::{run_stats, StatsArgs};
