//! Hinglish Translator - 选中文本与整页的 Hinglish/Hindi 翻译库
//!
//! 页面上下文把文本发给持有请求分发器的后台上下文，结果以浮层或页面原地修改的形式返回。

pub mod action;
pub mod api_constants;
pub mod background;
pub mod config;
pub mod error;
pub mod html_processor;
pub mod messaging;
pub mod overlay;
pub mod page;
pub mod prompts;
pub mod selection;
pub mod settings;
pub mod stats;
pub mod translator;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::{Result, TranslationError};
pub use messaging::{Command, Reply, TranslationBackend};
pub use page::{Page, PageOrchestrator, PageTranslationReport};
pub use translator::Dispatcher;
pub use types::{Level, Mode, PageMode, Style, TranslationRequest, TranslationResult};
