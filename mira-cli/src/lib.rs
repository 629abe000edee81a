//! mira-cli: wires camera, models, sampler and reaction endpoint together

pub mod app;
pub mod cli;
pub mod config;
pub mod supervisor;
pub mod workers;


pub use app::{run, App, StopReason};
pub use cli::Cli;
pub use config::MiraConfig;
pub use supervisor::TaskSupervisor;
