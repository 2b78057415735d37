use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{EngineError, Result};

/// 存储凭据的解密函数
pub trait SecretCipher: Send + Sync {
    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

impl<F> SecretCipher for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        self(ciphertext)
    }
}

/// 凭据以明文保存（本地开发）
#[derive(Default, Clone)]
pub struct PlaintextCipher;

impl SecretCipher for PlaintextCipher {
    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        Ok(ciphertext.to_string())
    }
}

/// base64 编码的凭据
#[derive(Default, Clone)]
pub struct Base64Cipher;

impl SecretCipher for Base64Cipher {
    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| EngineError::provider(format!("failed to decode credential: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|_| EngineError::provider("decoded credential is not valid UTF-8"))
    }
}
