//! Command implementations for the CLI.

mod check;
mod config;
mod export;
mod read;
mod sleep;
mod voice;
mod watch;

pub use check::cmd_check;
pub use config::cmd_config;
pub use export::cmd_export;
pub use read::{ReadArgs, cmd_read};
pub use sleep::cmd_sleep;
pub use voice::cmd_voice;
pub use watch::{WatchArgs, cmd_watch};
