//! 核心请求/结果类型，所有上下文共用

// 标准库导入
use std::fmt;
use std::str::FromStr;

// 第三方crate导入
use serde::{Deserialize, Serialize};

// 本地模块导入
use crate::error::{Result, TranslationError};

/// 要求模型执行的任务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// 翻译文本
    Translate,
    /// 解释文本
    Explain,
}

/// Output language and register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    /// Hindi in Latin script mixed with English
    #[default]
    Hinglish,
    /// Hindi in Devanagari script
    Hindi,
    /// Hindi text romanized
    Roman,
    /// Professional Hinglish
    Formal,
    /// Conversational Hinglish
    Casual,
}

/// 印地语词汇比例
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    /// Even mix
    #[default]
    Balanced,
    /// Lean towards Hindi words
    MoreHindi,
    /// Lean towards English words
    MoreEnglish,
}

/// Whole-page selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageMode {
    /// One request per single-text-node element
    #[default]
    Paragraphs,
    /// Batched requests over every text node
    AllText,
}

impl Style {
    /// 所有风格，按表顺序
    pub const ALL: [Style; 5] = [
        Style::Hinglish,
        Style::Hindi,
        Style::Roman,
        Style::Formal,
        Style::Casual,
    ];

    /// 存储名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Hinglish => "hinglish",
            Style::Hindi => "hindi",
            Style::Roman => "roman",
            Style::Formal => "formal",
            Style::Casual => "casual",
        }
    }
}

impl Level {
    /// 所有程度，按表顺序
    pub const ALL: [Level; 3] = [Level::Balanced, Level::MoreHindi, Level::MoreEnglish];

    /// 存储名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Balanced => "balanced",
            Level::MoreHindi => "moreHindi",
            Level::MoreEnglish => "moreEnglish",
        }
    }
}

impl PageMode {
    /// 存储名称
    pub fn as_str(&self) -> &'static str {
        match self {
            PageMode::Paragraphs => "paragraphs",
            PageMode::AllText => "allText",
        }
    }
}

impl Mode {
    /// 日志中使用的小写名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Translate => "translate",
            Mode::Explain => "explain",
        }
    }
}

impl FromStr for Style {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self> {
        Style::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| crate::translation_error!(config, "style", format!("unknown style '{}'", s)))
    }
}

impl FromStr for Level {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| crate::translation_error!(config, "level", format!("unknown level '{}'", s)))
    }
}

impl FromStr for PageMode {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "paragraphs" => Ok(PageMode::Paragraphs),
            "allText" => Ok(PageMode::AllText),
            other => Err(crate::translation_error!(
                config,
                "pageMode",
                format!("unknown page mode '{}'", other)
            )),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 请求分发的一个工作单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    /// 翻译或解释
    pub mode: Mode,
    /// 输出风格
    pub style: Style,
    /// 印地语词汇比例
    pub level: Level,
}

impl TranslationRequest {
    /// 构建请求，文本去除首尾空白且不能为空
    pub fn new(text: &str, mode: Mode, style: Style, level: Level) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TranslationError::NoSelection);
        }
        Ok(Self {
            text: trimmed.to_string(),
            mode,
            style,
            level,
        })
    }

    /// 去除空白后的非空文本
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// 一次分发的归一化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    /// 生成文本，去除空白且非空
    Success {
        /// 生成文本
        text: String,
    },
    /// 可读的失败原因
    Failure {
        /// 原因
        reason: String,
    },
}

impl TranslationResult {
    /// 非空文本为成功，否则为 `Failure("empty result")`
    pub fn success(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::from(TranslationError::EmptyResult)
        } else {
            TranslationResult::Success {
                text: trimmed.to_string(),
            }
        }
    }

    /// 以给定原因构造失败
    pub fn failure(reason: impl Into<String>) -> Self {
        TranslationResult::Failure {
            reason: reason.into(),
        }
    }

    /// 是否成功
    pub fn is_success(&self) -> bool {
        matches!(self, TranslationResult::Success { .. })
    }
}

impl From<TranslationError> for TranslationResult {
    fn from(error: TranslationError) -> Self {
        TranslationResult::Failure {
            reason: error.reason(),
        }
    }
}

impl From<Result<String>> for TranslationResult {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(text) => TranslationResult::success(&text),
            Err(e) => e.into(),
        }
    }
}
