//! CLI subcommand implementations.

pub mod archive;
pub mod channel;
pub mod ignore;
pub mod rebuild;
pub mod reconstruct;
pub mod report;
pub mod status;
pub mod top;
mod util;
pub mod watch;
