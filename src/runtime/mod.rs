// 运行时执行模块

mod executor;
mod runner;
mod types;

pub use runner::WorkflowRunner;
pub use types::{RunRequest, RunResult};
