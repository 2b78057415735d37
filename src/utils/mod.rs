/// 工具模块 - 日志初始化和反序列化辅助
pub(crate) mod de;
pub mod logging;

pub use logging::LoggingConfig;
