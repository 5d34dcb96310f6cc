//! One module per subcommand, each exposing `execute`.

pub mod generate;
pub mod get;
pub mod health;
pub mod init;
pub mod list;
pub mod remove;
pub mod set;
pub mod verify;
