//! 页面上下文模块
//!
//! [`Page`] 是解析后的文档加上其上显示的浮层。[`PageOrchestrator`] 决定哪些文本还需要翻译，
//! 通过 [`TranslationBackend`] 发出请求，写回结果并打上标记，之后的运行不会再处理它们。
//!
//! 各单元按文档顺序依次处理，不做并发。

// 标准库导入
use std::sync::Arc;
use std::time::Instant;

// 第三方crate导入
use markup5ever_rcdom::RcDom;
use tracing::{debug, info, warn};

// 本地模块导入
use crate::action::{run_selection_action, Invocation};
use crate::api_constants::page_config;
use crate::config::PageConfig;
use crate::error::{Result, TranslationError};
use crate::html_processor::{
    add_class, collect_text_fragments, node_text, parse_html, serialize_dom_to_html,
    set_node_text, single_text_child, structured_candidates, wrap_text_in_marked_span,
    TextFragment,
};
use crate::messaging::{Command, Envelope, Inbox, Reply, TranslationBackend};
use crate::overlay::{Overlay, OverlayLayer, ProgressStatus};
use crate::selection::Selection;
use crate::settings::{load_settings, SettingsStore};
use crate::types::{Mode, PageMode, TranslationResult};

/// 已加载的文档及其浮层
pub struct Page {
    dom: RcDom,
    overlays: OverlayLayer,
}

impl Page {
    /// 从HTML加载页面，重新加载会清除所有标记
    pub fn parse(html: &str) -> Result<Self> {
        Ok(Self {
            dom: parse_html(html)?,
            overlays: OverlayLayer::new(),
        })
    }

    /// 空页面，用于纯文本选区
    pub fn blank() -> Result<Self> {
        Self::parse("<html><head></head><body></body></html>")
    }

    /// 文档
    pub fn dom(&self) -> &RcDom {
        &self.dom
    }

    /// 已显示的浮层
    pub fn overlays(&self) -> &OverlayLayer {
        &self.overlays
    }

    /// 当前文档的HTML
    pub fn to_html(&self) -> Result<String> {
        serialize_dom_to_html(&self.dom)
    }
}

/// 一次整页运行的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTranslationReport {
    /// 使用的策略
    pub mode: PageMode,
    /// 选中的元素（结构化）或片段（批量）
    pub candidates: usize,
    /// 发送的请求数
    pub requests: usize,
    /// 已翻译的元素或片段
    pub translated: usize,
    /// 对应单元未被修改的请求数
    pub failed_units: usize,
    /// 因所在单元失败而未修改的片段数
    pub untouched: usize,
}

impl PageTranslationReport {
    fn new(mode: PageMode, candidates: usize) -> Self {
        Self {
            mode,
            candidates,
            ..Default::default()
        }
    }

    /// 所有请求均失败
    pub fn all_failed(&self) -> bool {
        self.requests > 0 && self.translated == 0
    }
}

/// 页面侧编排
pub struct PageOrchestrator {
    backend: Arc<dyn TranslationBackend>,
    store: Arc<dyn SettingsStore>,
    config: PageConfig,
}

impl PageOrchestrator {
    /// 向 `backend` 发送请求并从 `store` 读取偏好的编排器
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        store: Arc<dyn SettingsStore>,
        config: PageConfig,
    ) -> Self {
        Self {
            backend,
            store,
            config,
        }
    }

    /// 按已保存的页面模式翻译整个页面
    ///
    /// 运行期间显示进度提示。
    pub async fn translate_page(&self, page: &mut Page) -> Result<PageTranslationReport> {
        let badge = page
            .overlays
            .show(Overlay::progress(ProgressStatus::Running));

        let outcome = match load_settings(self.store.as_ref()).await {
            Ok(settings) => Ok(self.translate_page_with_mode(page, settings.page_mode).await),
            Err(e) => Err(e),
        };

        let status = match &outcome {
            Ok(report) if !report.all_failed() => ProgressStatus::Complete,
            Ok(_) => ProgressStatus::Failed,
            Err(e) => {
                warn!("page translation aborted: {}", e);
                ProgressStatus::Failed
            }
        };
        page.overlays
            .update_at(badge, Overlay::progress(status), Instant::now());
        outcome
    }

    /// 按指定策略翻译整个页面
    pub async fn translate_page_with_mode(
        &self,
        page: &Page,
        mode: PageMode,
    ) -> PageTranslationReport {
        let started = Instant::now();
        let report = match mode {
            PageMode::Paragraphs => self.translate_structured(&page.dom).await,
            PageMode::AllText => self.translate_bulk(&page.dom).await,
        };
        info!(
            "{} run: {}/{} translated with {} requests in {}ms",
            mode,
            report.translated,
            report.candidates,
            report.requests,
            started.elapsed().as_millis()
        );
        report
    }

    /// 每个唯一子节点为文本的元素发送一个请求
    async fn translate_structured(&self, dom: &RcDom) -> PageTranslationReport {
        let marker = page_config::TRANSLATED_MARKER_CLASS;
        let candidates = structured_candidates(dom, page_config::STRUCTURED_TAGS, marker);
        let mut report = PageTranslationReport::new(PageMode::Paragraphs, candidates.len());

        for element in candidates {
            let Some(text_node) = single_text_child(&element) else {
                continue;
            };
            let original = node_text(&text_node).unwrap_or_default();

            report.requests += 1;
            match self.backend.request(Mode::Translate, &original).await {
                TranslationResult::Success { text } => {
                    set_node_text(&text_node, &text);
                    add_class(&element, marker);
                    report.translated += 1;
                }
                TranslationResult::Failure { reason } => {
                    debug!("element left untranslated: {}", reason);
                    report.failed_units += 1;
                    report.untouched += 1;
                }
            }
        }

        report
    }

    /// 对所有文本节点分批请求
    async fn translate_bulk(&self, dom: &RcDom) -> PageTranslationReport {
        let marker = page_config::TRANSLATED_MARKER_CLASS;
        let fragments = collect_text_fragments(dom, marker);
        let mut report = PageTranslationReport::new(PageMode::AllText, fragments.len());

        for (index, batch) in fragments.chunks(self.config.batch_size()).enumerate() {
            let combined = batch
                .iter()
                .map(|fragment| fragment.text.as_str())
                .collect::<Vec<_>>()
                .join(self.config.join_separator());

            report.requests += 1;
            let failure = match self.backend.request(Mode::Translate, &combined).await {
                TranslationResult::Success { text } => match self.apply_batch(batch, &text) {
                    Ok(applied) => {
                        report.translated += applied;
                        report.untouched += batch.len() - applied;
                        continue;
                    }
                    Err(e) => e.to_string(),
                },
                TranslationResult::Failure { reason } => reason,
            };

            warn!("batch {} left untranslated: {}", index + 1, failure);
            report.failed_units += 1;
            report.untouched += batch.len();
        }

        report
    }

    /// 把批次应答拆回各片段；数量不符时整批不应用
    ///
    /// 每个已应用片段包进各自的标记span，同一元素下失败的片段下次运行仍会被选中。
    fn apply_batch(&self, batch: &[TextFragment], reply: &str) -> Result<usize> {
        let parts = split_batch_reply(reply, self.config.split_separator());
        if parts.len() != batch.len() {
            return Err(TranslationError::BatchSplitMismatch {
                expected: batch.len(),
                actual: parts.len(),
            });
        }

        let mut applied = 0;
        for (fragment, part) in batch.iter().zip(parts) {
            if part.is_empty() {
                continue;
            }
            set_node_text(&fragment.node, part);
            wrap_text_in_marked_span(
                &fragment.parent,
                &fragment.node,
                page_config::TRANSLATED_MARKER_CLASS,
            );
            applied += 1;
        }
        Ok(applied)
    }

    /// 翻译或解释 `page` 上的选区
    pub async fn translate_selection(
        &self,
        page: &mut Page,
        mode: Mode,
        selection: &Selection,
    ) -> Invocation {
        run_selection_action(self.backend.as_ref(), &mut page.overlays, mode, selection).await
    }

    /// 处理发给页面的命令，整页运行返回报告
    pub async fn handle_envelope(
        &self,
        page: &mut Page,
        mut envelope: Envelope,
    ) -> Option<PageTranslationReport> {
        // 页面命令不等待结果，先确认再执行
        envelope.respond(Reply::Ack);
        match envelope.command {
            Command::TranslatePage => match self.translate_page(page).await {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!("translatePage failed: {}", e);
                    None
                }
            },
            Command::TranslateText { text } => {
                self.translate_selection(page, Mode::Translate, &Selection::Text(text))
                    .await;
                None
            }
            Command::ExplainText { text } => {
                self.translate_selection(page, Mode::Explain, &Selection::Text(text))
                    .await;
                None
            }
        }
    }

    /// 持续处理页面命令，直到所有发送端被丢弃
    pub async fn listen(&self, page: &mut Page, mut inbox: Inbox) {
        while let Some(envelope) = inbox.recv().await {
            debug!("page received {}", envelope.command.action());
            self.handle_envelope(page, envelope).await;
        }
    }
}

/// 将批次应答拆分为去除空白的片段
pub fn split_batch_reply<'a>(reply: &'a str, separator: &str) -> Vec<&'a str> {
    reply.split(separator).map(str::trim).collect()
}
