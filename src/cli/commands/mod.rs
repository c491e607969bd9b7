//! CLI command implementations.

mod ask;
mod process;
mod serve;
mod status;

pub use ask::run_ask;
pub use process::run_process;
pub use serve::run_serve;
pub use status::run_status;
