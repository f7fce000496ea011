//! 统一错误处理模块
//!
//! 为请求分发、消息通道和页面编排提供统一的错误类型。

// 标准库导入
use std::fmt;

// 第三方crate导入
use anyhow::Error as AnyhowError;

// 本地模块导入
use crate::api_constants::error_messages;

/// 统一错误类型
///
/// 前五个变体是用户会在浮层中看到的失败，其余是内部管道错误，
/// 归一化后同样以失败原因呈现。
#[derive(Debug)]
pub enum TranslationError {
    /// 设置存储中没有API密钥
    MissingCredential,

    /// 端点返回非2xx状态或无法解析的响应体
    Endpoint {
        /// HTTP状态码
        status: u16,
        /// 端点错误消息或通用消息
        message: String,
    },

    /// 端点返回空白文本
    EmptyResult,

    /// 批次应答拆分后的段数与片段数不一致
    BatchSplitMismatch {
        /// 发送的片段数
        expected: usize,
        /// 收到的段数
        actual: usize,
    },

    /// 未选中任何内容（或只有空白）
    NoSelection,

    /// 收到状态码之前的传输失败
    Network {
        /// 错误消息
        message: String,
    },

    /// HTML解析或序列化失败
    HtmlParse {
        /// 详细信息
        details: String,
    },

    /// 文件操作错误
    FileOperation {
        /// 文件路径
        path: String,
        /// 操作类型（读取、写入等）
        operation: String,
        /// 底层错误
        source: String,
    },

    /// 配置或已存设置无效
    Configuration {
        /// 字段名
        field: String,
        /// 原因
        reason: String,
    },

    /// 消息通道的另一端已关闭
    Channel {
        /// 详细信息
        details: String,
    },

    /// 包装的anyhow错误
    Internal {
        /// 被包装的错误
        source: AnyhowError,
    },
}

impl TranslationError {
    /// `TranslationResult::Failure` 携带的简短原因
    pub fn reason(&self) -> String {
        match self {
            TranslationError::MissingCredential => error_messages::MISSING_CREDENTIAL.to_string(),
            TranslationError::Endpoint { message, .. } => message.clone(),
            TranslationError::EmptyResult => error_messages::EMPTY_RESULT.to_string(),
            TranslationError::NoSelection => error_messages::NO_SELECTION.to_string(),
            TranslationError::Network { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::MissingCredential => {
                write!(f, "{}", error_messages::MISSING_CREDENTIAL)
            }
            TranslationError::Endpoint { status, message } => {
                write!(f, "endpoint error [{}]: {}", status, message)
            }
            TranslationError::EmptyResult => write!(f, "{}", error_messages::EMPTY_RESULT),
            TranslationError::BatchSplitMismatch { expected, actual } => {
                write!(
                    f,
                    "batch split mismatch: expected {} parts, got {}",
                    expected, actual
                )
            }
            TranslationError::NoSelection => write!(f, "{}", error_messages::NO_SELECTION),
            TranslationError::Network { message } => write!(f, "network error: {}", message),
            TranslationError::HtmlParse { details } => write!(f, "HTML parse error: {}", details),
            TranslationError::FileOperation {
                path,
                operation,
                source,
            } => {
                write!(f, "file {} failed [{}]: {}", operation, path, source)
            }
            TranslationError::Configuration { field, reason } => {
                write!(f, "configuration error [{}]: {}", field, reason)
            }
            TranslationError::Channel { details } => write!(f, "message channel closed: {}", details),
            TranslationError::Internal { source } => write!(f, "internal error: {}", source),
        }
    }
}

impl std::error::Error for TranslationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranslationError::Internal { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// 统一Result类型别名
pub type Result<T> = std::result::Result<T, TranslationError>;

/// 便捷错误构造宏
#[macro_export]
macro_rules! translation_error {
    (endpoint, $code:expr, $msg:expr) => {
        $crate::error::TranslationError::Endpoint {
            status: $code,
            message: $msg.to_string(),
        }
    };
    (network, $msg:expr) => {
        $crate::error::TranslationError::Network {
            message: $msg.to_string(),
        }
    };
    (html_parse, $details:expr) => {
        $crate::error::TranslationError::HtmlParse {
            details: $details.to_string(),
        }
    };
    (file_op, $path:expr, $op:expr, $source:expr) => {
        $crate::error::TranslationError::FileOperation {
            path: $path.to_string(),
            operation: $op.to_string(),
            source: $source.to_string(),
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::TranslationError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
    (channel, $details:expr) => {
        $crate::error::TranslationError::Channel {
            details: $details.to_string(),
        }
    };
}

impl From<AnyhowError> for TranslationError {
    fn from(error: AnyhowError) -> Self {
        TranslationError::Internal { source: error }
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => TranslationError::Endpoint {
                status: status.as_u16(),
                message: error.to_string(),
            },
            None => TranslationError::Network {
                message: error.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::FileOperation {
            path: "unknown".to_string(),
            operation: "io".to_string(),
            source: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::Configuration {
            field: "json".to_string(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranslationError::Endpoint {
            status: 500,
            message: "Internal".to_string(),
        };
        assert_eq!(format!("{}", err), "endpoint error [500]: Internal");

        let err = TranslationError::BatchSplitMismatch {
            expected: 3,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "batch split mismatch: expected 3 parts, got 1"
        );
    }

    #[test]
    fn test_failure_reasons() {
        assert_eq!(TranslationError::MissingCredential.reason(), "missing credential");
        assert_eq!(TranslationError::EmptyResult.reason(), "empty result");
        assert_eq!(TranslationError::NoSelection.reason(), "no selection");
        let err = translation_error!(endpoint, 429, "rate limited");
        assert_eq!(err.reason(), "rate limited");
    }

    #[test]
    fn test_error_macro() {
        let err = translation_error!(config, "style", "unknown value");
        match err {
            TranslationError::Configuration { field, reason } => {
                assert_eq!(field, "style");
                assert_eq!(reason, "unknown value");
            }
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_anyhow_conversion() {
        let anyhow_err = anyhow::anyhow!("boom");
        let translation_err: TranslationError = anyhow_err.into();
        assert!(matches!(translation_err, TranslationError::Internal { .. }));
    }
}
