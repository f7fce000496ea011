//! 翻译API常量定义
//!
//! 请求分发、页面编排和命令行共用的固定值都集中在这里。

/// 远程聊天补全端点配置
pub mod api_config {
    /// 默认聊天补全端点（Groq，兼容OpenAI）
    pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

    /// 固定模型ID
    pub const MODEL_ID: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

    /// 固定采样温度
    pub const TEMPERATURE: f32 = 0.7;

    /// 翻译/解释请求的固定输出长度
    pub const MAX_TOKENS: u32 = 1000;

    /// 密钥校验请求的输出长度
    pub const VERIFY_MAX_TOKENS: u32 = 10;

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
}

/// 持久化设置键名
pub mod storage_keys {
    /// API密钥
    pub const API_KEY: &str = "groqApiKey";

    /// `{style, level}` 记录
    pub const TRANSLATION_SETTINGS: &str = "translationSettings";

    /// 整页翻译模式偏好
    pub const TRANSLATION_MODE: &str = "translationMode";

    /// JSON设置文件名
    pub const SETTINGS_FILE_NAME: &str = "settings.json";
}

/// 页面编排配置
pub mod page_config {
    /// 批量模式每批片段数
    pub const DEFAULT_BATCH_SIZE: usize = 3;

    /// 拼接同一批次片段的分隔符
    pub const BATCH_JOIN_SEPARATOR: &str = "\n--SPLIT--\n";

    /// 拆分批次应答的分隔符。
    ///
    /// 注意第三个短横线：与 [`BATCH_JOIN_SEPARATOR`] 不同。模型原样回显拼接分隔符时
    /// 只会得到一段，整批按数量不符失败。在确认预期分隔符之前保持现状。
    pub const BATCH_SPLIT_SEPARATOR: &str = "\n---SPLIT---\n";

    /// 标记已翻译内容的CSS类名
    pub const TRANSLATED_MARKER_CLASS: &str = "hinglish-translated";

    /// 结构化模式考虑的元素
    pub const STRUCTURED_TAGS: &[&str] = &[
        "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "span", "div",
    ];

    /// 文本永不发送翻译的元素
    pub const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

    /// 选区提取中列表项的前缀
    pub const LIST_ITEM_PREFIX: &str = "• ";
}

/// 浮层时间配置
pub mod overlay_config {
    /// 错误浮层在此毫秒数后自动关闭
    pub const ERROR_AUTO_DISMISS_MS: u64 = 5000;

    /// 整页进度提示在运行结束后保留的时长
    pub const PROGRESS_AUTO_DISMISS_MS: u64 = 2000;

    /// 加载浮层的DOM id
    pub const LOADING_OVERLAY_ID: &str = "translationLoadingPopup";
}

/// 面向用户的消息
pub mod error_messages {
    /// 未保存密钥
    pub const MISSING_CREDENTIAL: &str = "missing credential";

    /// 端点返回空白文本
    pub const EMPTY_RESULT: &str = "empty result";

    /// 选区为空
    pub const NO_SELECTION: &str = "no selection";

    /// 消息通道上翻译失败应答的前缀
    pub const TRANSLATION_ERROR_PREFIX: &str = "Translation error: ";

    /// 消息通道上解释失败应答的前缀
    pub const EXPLANATION_ERROR_PREFIX: &str = "Explanation error: ";

    /// 启动时缺少密钥的提示
    pub const SETUP_HINT: &str = "run `hinglish-translator setup --key <API_KEY>` first";
}

/// 获取端点URL，优先使用非空的自定义地址
pub fn get_api_url(custom_api: Option<&str>) -> &str {
    match custom_api {
        Some(custom) if !custom.trim().is_empty() => custom,
        _ => api_config::DEFAULT_API_URL,
    }
}

/// 验证URL是否为http或https
pub fn is_valid_api_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// 获取批量大小，不会为零
pub fn get_batch_size(custom_size: Option<usize>) -> usize {
    match custom_size {
        Some(0) | None => page_config::DEFAULT_BATCH_SIZE,
        Some(size) => size,
    }
}
