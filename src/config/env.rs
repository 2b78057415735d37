use crate::error::{EngineError, Result};
use std::env;

pub const DEBUG_ENV: &str = "GENFLOW_DEBUG";

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 解析密钥，支持 `${VAR_NAME}` 形式的环境变量引用
    pub fn resolve_secret(value: &str) -> Result<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let env_var_name = &value[2..value.len() - 1];
            Self::get_env(env_var_name)
        } else {
            Ok(value.to_string())
        }
    }

    /// 从环境变量获取值
    pub fn get_env(key: &str) -> Result<String> {
        env::var(key).map_err(|_| {
            EngineError::configuration(format!("environment variable `{key}` is not set"))
        })
    }

    /// 获取可选的环境变量
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// 读取并解析可选的环境变量，解析失败时返回 None
    pub fn get_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
        Self::get_env_optional(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn is_debug_mode() -> bool {
        env::var(DEBUG_ENV).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_secret_direct() {
        let result = EnvConfig::resolve_secret("sk-1234567890abcdef");
        assert_eq!(result.unwrap(), "sk-1234567890abcdef");
    }

    #[test]
    fn test_resolve_secret_env_var() {
        env::set_var("GENFLOW_TEST_SECRET", "from_env");
        let result = EnvConfig::resolve_secret("${GENFLOW_TEST_SECRET}");
        assert_eq!(result.unwrap(), "from_env");
        env::remove_var("GENFLOW_TEST_SECRET");
    }

    #[test]
    fn test_resolve_secret_missing_env_var() {
        let result = EnvConfig::resolve_secret("${GENFLOW_TEST_UNSET_SECRET}");
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_get_parsed() {
        env::set_var("GENFLOW_TEST_NUMBER", " 42 ");
        assert_eq!(EnvConfig::get_parsed::<usize>("GENFLOW_TEST_NUMBER"), Some(42));
        env::set_var("GENFLOW_TEST_NUMBER", "nope");
        assert_eq!(EnvConfig::get_parsed::<usize>("GENFLOW_TEST_NUMBER"), None);
        env::remove_var("GENFLOW_TEST_NUMBER");
    }
}
