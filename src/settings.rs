//! 设置存储模块
//!
//! 所有上下文共享的持久化键值区。读取结果不做缓存：每次操作开始时都通过 [`load_settings`]
//! 重新读取，两次请求之间的修改总能生效。

// 标准库导入
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

// 第三方crate导入
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

// 本地模块导入
use crate::api_constants::storage_keys;
use crate::error::Result;
use crate::translation_error;
use crate::types::{Level, Mode, PageMode, Style};

/// 保存密钥与偏好的异步键值存储
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// 读取值，键不存在时为 `None`
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// 写入值
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// 删除键，删除不存在的键不算错误
    async fn remove(&self, key: &str) -> Result<()>;
}

/// 进程内存储
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettingsStore {
    /// 空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置密钥的存储
    pub fn with_api_key(api_key: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(
            storage_keys::API_KEY.to_string(),
            Value::String(api_key.to_string()),
        );
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// 以单个JSON对象持久化到磁盘的存储
///
/// 每次调用都重新读取文件，进程内的写入串行执行。
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    /// 以 `path` 为后端的存储，首次写入时创建文件
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// 后端文件
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(translation_error!(file_op, self.path.display(), "read", e)),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(translation_error!(
                config,
                self.path.display(),
                "settings file is not a JSON object"
            )),
        }
    }

    async fn write_all(&self, map: Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| translation_error!(file_op, parent.display(), "create", e))?;
            }
        }

        let content = serde_json::to_string_pretty(&Value::Object(map))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| translation_error!(file_op, self.path.display(), "write", e))?;
        debug!("settings written to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);
        self.write_all(map).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        if map.remove(key).is_some() {
            self.write_all(map).await?;
        }
        Ok(())
    }
}

/// 已保存的 `translationSettings` 记录，保留原始名称
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSettings {
    /// 风格名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// 程度名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl TranslationSettings {
    /// 解析为 `mode` 请求使用的类型化取值
    ///
    /// 缺失的名称取默认值。翻译模式的指令表按组合索引，任一侧名称未知时整体回退到
    /// `(hinglish, balanced)`；解释模式逐字段生成指令，未知名称只重置该字段。
    pub fn resolve(&self, mode: Mode) -> (Style, Level) {
        let style = self.style.as_deref().map(str::parse::<Style>);
        let level = self.level.as_deref().map(str::parse::<Level>);
        let unknown = matches!(style, Some(Err(_))) || matches!(level, Some(Err(_)));
        if unknown {
            warn!(
                "unknown translation settings {:?}/{:?} for {}",
                self.style,
                self.level,
                mode.as_str()
            );
        }

        match mode {
            Mode::Translate if unknown => (Style::Hinglish, Level::Balanced),
            _ => (
                style.and_then(|s| s.ok()).unwrap_or_default(),
                level.and_then(|l| l.ok()).unwrap_or_default(),
            ),
        }
    }
}

/// 从存储读取的设置快照
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// 密钥，缺失或空白时为 `None`
    pub api_key: Option<String>,
    /// 已保存的风格与程度名称
    pub translation: TranslationSettings,
    /// 整页翻译策略
    pub page_mode: PageMode,
}

impl Settings {
    /// `mode` 请求使用的风格与程度
    pub fn style_level(&self, mode: Mode) -> (Style, Level) {
        self.translation.resolve(mode)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("translation", &self.translation)
            .field("page_mode", &self.page_mode)
            .finish()
    }
}

/// 读取当前设置，缺失键使用默认值
pub async fn load_settings(store: &dyn SettingsStore) -> Result<Settings> {
    let api_key = load_api_key(store).await?;

    let translation = match store.get(storage_keys::TRANSLATION_SETTINGS).await? {
        Some(value) => serde_json::from_value::<TranslationSettings>(value).unwrap_or_else(|e| {
            warn!("ignoring malformed translation settings: {}", e);
            TranslationSettings::default()
        }),
        None => TranslationSettings::default(),
    };

    let page_mode = match store.get(storage_keys::TRANSLATION_MODE).await? {
        Some(Value::String(name)) => name.parse::<PageMode>().unwrap_or_else(|e| {
            warn!("{}, using paragraphs", e);
            PageMode::Paragraphs
        }),
        Some(other) => {
            warn!("ignoring non-string page mode {}", other);
            PageMode::Paragraphs
        }
        None => PageMode::default(),
    };

    Ok(Settings {
        api_key,
        translation,
        page_mode,
    })
}

/// 仅读取密钥
pub async fn load_api_key(store: &dyn SettingsStore) -> Result<Option<String>> {
    Ok(match store.get(storage_keys::API_KEY).await? {
        Some(Value::String(key)) if !key.trim().is_empty() => Some(key.trim().to_string()),
        _ => None,
    })
}

/// 保存密钥
pub async fn save_api_key(store: &dyn SettingsStore, api_key: &str) -> Result<()> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(translation_error!(config, "apiKey", "API key is empty"));
    }
    store
        .set(storage_keys::API_KEY, Value::String(api_key.to_string()))
        .await
}

/// 删除密钥
pub async fn remove_api_key(store: &dyn SettingsStore) -> Result<()> {
    store.remove(storage_keys::API_KEY).await
}

/// 保存 `{style, level}` 记录
pub async fn save_translation_settings(
    store: &dyn SettingsStore,
    style: Style,
    level: Level,
) -> Result<()> {
    let record = TranslationSettings {
        style: Some(style.as_str().to_string()),
        level: Some(level.as_str().to_string()),
    };
    store
        .set(storage_keys::TRANSLATION_SETTINGS, serde_json::to_value(record)?)
        .await
}

/// 保存页面模式偏好
pub async fn save_page_mode(store: &dyn SettingsStore, mode: PageMode) -> Result<()> {
    store
        .set(
            storage_keys::TRANSLATION_MODE,
            Value::String(mode.as_str().to_string()),
        )
        .await
}
