//! 配置管理模块
//!
//! 命令行参数解析，以及请求分发和整页翻译的配置构建器。

// 标准库导入
use std::path::PathBuf;
use std::time::Duration;

// 第三方crate导入
use clap::{Args, Parser, Subcommand};

// 本地模块导入
use crate::api_constants::{api_config, get_api_url, is_valid_api_url, page_config};
use crate::error::Result;
use crate::translation_error;
use crate::types::{Level, PageMode, Style};

/// 请求分发配置
///
/// 温度和输出长度是固定配置，不属于用户设置。
///
/// # Examples
///
/// ```rust
/// use hinglish_translator::config::TranslatorConfig;
///
/// let config = TranslatorConfig::new()
///     .with_api_url("http://localhost:8080/v1/chat/completions")
///     .with_timeout_secs(10);
/// assert_eq!(config.max_tokens(), 1000);
/// ```
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// 聊天补全端点
    api_url: String,
    /// 模型ID
    model: String,
    /// 采样温度
    temperature: f32,
    /// 输出长度
    max_tokens: u32,
    /// 请求超时
    timeout_secs: u64,
}

impl TranslatorConfig {
    /// 使用 [`api_config`] 中的默认值
    pub fn new() -> Self {
        Self {
            api_url: api_config::DEFAULT_API_URL.to_string(),
            model: api_config::MODEL_ID.to_string(),
            temperature: api_config::TEMPERATURE,
            max_tokens: api_config::MAX_TOKENS,
            timeout_secs: api_config::REQUEST_TIMEOUT_SECONDS,
        }
    }

    /// 端点URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 模型ID
    pub fn model(&self) -> &str {
        &self.model
    }

    /// 采样温度
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// 输出长度
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// 请求超时
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 设置端点URL
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    /// 设置请求超时
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 验证端点URL
    pub fn validate(&self) -> Result<()> {
        if !is_valid_api_url(&self.api_url) {
            return Err(translation_error!(
                config,
                "api_url",
                format!("not an http(s) URL: {}", self.api_url)
            ));
        }
        Ok(())
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 整页翻译配置
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// 批量模式每批片段数
    batch_size: usize,
    /// 请求中拼接片段的分隔符
    join_separator: String,
    /// 拆分应答的分隔符
    split_separator: String,
}

impl PageConfig {
    /// 使用 [`page_config`] 中的默认值
    pub fn new() -> Self {
        Self {
            batch_size: page_config::DEFAULT_BATCH_SIZE,
            join_separator: page_config::BATCH_JOIN_SEPARATOR.to_string(),
            split_separator: page_config::BATCH_SPLIT_SEPARATOR.to_string(),
        }
    }

    /// 每批片段数
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 拼接分隔符
    pub fn join_separator(&self) -> &str {
        &self.join_separator
    }

    /// 拆分分隔符
    pub fn split_separator(&self) -> &str {
        &self.split_separator
    }

    /// 设置批量大小，零会被忽略
    pub fn with_batch_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.batch_size = size;
        }
        self
    }

    /// 同时设置两个分隔符
    pub fn with_separators(mut self, join: &str, split: &str) -> Self {
        self.join_separator = join.to_string();
        self.split_separator = split.to_string();
        self
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// CLI arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Translate or explain web page text in Hinglish/Hindi", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// 聊天补全端点
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Action to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// 根据全局参数生成请求分发配置
    pub fn translator_config(&self) -> TranslatorConfig {
        TranslatorConfig::new().with_api_url(get_api_url(self.endpoint.as_deref()))
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify and store the API key
    Setup {
        /// API key
        #[arg(long)]
        key: String,

        /// Store without a test request
        #[arg(long)]
        skip_verify: bool,
    },

    /// Remove the stored API key
    Forget,

    /// Show or update translation preferences
    Settings {
        /// Output style
        #[arg(long, value_parser = parse_style)]
        style: Option<Style>,

        /// Hindi word density
        #[arg(long, value_parser = parse_level)]
        level: Option<Level>,

        /// Whole-page strategy
        #[arg(long, value_parser = parse_page_mode)]
        page_mode: Option<PageMode>,
    },

    /// Translate a selection
    Translate(SelectionArgs),

    /// Explain a selection
    Explain(SelectionArgs),

    /// Translate a whole page
    Page {
        /// Input HTML file or web page URL
        #[arg(short, long, value_name = "FILE_OR_URL")]
        input: String,

        /// Output file (defaults to input name + `_hi`)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Override the stored page mode for this run
        #[arg(long, value_parser = parse_page_mode)]
        mode: Option<PageMode>,

        /// 批量模式每批片段数
        #[arg(long, default_value_t = page_config::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Print run statistics
        #[arg(long)]
        stats: bool,
    },

    /// Answer one JSON message read from stdin
    Message,
}

/// Where the selection comes from
#[derive(Args, Debug)]
pub struct SelectionArgs {
    /// Selected text
    #[arg(short, long, conflicts_with = "input")]
    pub text: Option<String>,

    /// HTML file or URL to select from
    #[arg(short, long, value_name = "FILE_OR_URL", requires = "select")]
    pub input: Option<String>,

    /// Elements to select: `tag`, `#id` or `.class`
    #[arg(short, long)]
    pub select: Option<String>,
}

fn parse_style(value: &str) -> std::result::Result<Style, String> {
    value.parse().map_err(|e: crate::error::TranslationError| e.to_string())
}

fn parse_level(value: &str) -> std::result::Result<Level, String> {
    value.parse().map_err(|e: crate::error::TranslationError| e.to_string())
}

fn parse_page_mode(value: &str) -> std::result::Result<PageMode, String> {
    value.parse().map_err(|e: crate::error::TranslationError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translator_defaults() {
        let config = TranslatorConfig::default();
        assert_eq!(config.api_url(), api_config::DEFAULT_API_URL);
        assert_eq!(config.model(), api_config::MODEL_ID);
        assert_eq!(config.temperature(), 0.7);
        assert_eq!(config.max_tokens(), 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let config = TranslatorConfig::new().with_api_url("ftp://example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_config_builder() {
        let config = PageConfig::new().with_batch_size(0);
        assert_eq!(config.batch_size(), 3);
        let config = config.with_batch_size(5).with_separators("|", "|");
        assert_eq!(config.batch_size(), 5);
        assert_eq!(config.join_separator(), config.split_separator());
    }

    #[test]
    fn test_cli_parses_page_command() {
        let cli = Cli::try_parse_from([
            "hinglish-translator",
            "--endpoint",
            "http://localhost:9000/v1/chat/completions",
            "page",
            "--input",
            "index.html",
            "--mode",
            "allText",
            "--batch-size",
            "4",
        ])
        .unwrap();

        assert_eq!(
            cli.translator_config().api_url(),
            "http://localhost:9000/v1/chat/completions"
        );
        match cli.command {
            Command::Page {
                input,
                mode,
                batch_size,
                ..
            } => {
                assert_eq!(input, "index.html");
                assert_eq!(mode, Some(PageMode::AllText));
                assert_eq!(batch_size, 4);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_style() {
        let parsed = Cli::try_parse_from(["hinglish-translator", "settings", "--style", "klingon"]);
        assert!(parsed.is_err());
    }
}
