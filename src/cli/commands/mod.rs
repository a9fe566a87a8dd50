//! CLI command implementations.

mod config;
mod create;
mod doctor;
mod init;
mod list;
mod process;
mod serve;
mod show;
mod upload;

pub use config::run_config;
pub use create::run_create;
pub use doctor::run_doctor;
pub use init::run_init;
pub use list::run_list;
pub use process::run_process;
pub use serve::run_serve;
pub use show::run_show;
pub use upload::run_upload;
