//! 页面浮层模块
//!
//! [`Overlay`] 是视图模型，只描述显示什么、用什么主题。[`render_overlay`] 负责生成标记，
//! 是唯一涉及展示的地方。[`OverlayLayer`] 记录页面上当前显示的浮层并执行关闭规则。

// 标准库导入
use std::time::{Duration, Instant};

// 第三方crate导入
use tracing::debug;

// 本地模块导入
use crate::api_constants::overlay_config;

/// 配色方案
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// 白色卡片
    Light,
    /// 红色卡片
    Danger,
    /// 蓝色徽标
    Info,
    /// 绿色徽标
    Success,
}

/// 整页运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    /// 运行中
    Running,
    /// 运行完成
    Complete,
    /// 运行失败
    Failed,
}

/// 浮层显示的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayKind {
    /// 请求进行中的加载动画
    Loading,
    /// 原文及译文
    Translation {
        /// 选中文本
        original: String,
        /// 译文
        translated: String,
    },
    /// 原文及解释
    Explanation {
        /// 选中文本
        original: String,
        /// 解释
        explanation: String,
    },
    /// 错误消息
    Error {
        /// 消息
        message: String,
    },
    /// 整页进度徽标
    PageProgress {
        /// 运行状态
        status: ProgressStatus,
    },
}

/// 浮层的关闭方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dismissal {
    /// 带关闭按钮
    pub close_button: bool,
    /// 点击外部时关闭
    pub outside_click: bool,
    /// 到时自动关闭
    pub auto_dismiss: Option<Duration>,
}

/// 浮层视图模型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    /// 内容
    pub kind: OverlayKind,
    /// 配色方案
    pub theme: Theme,
}

impl Overlay {
    /// 加载动画
    pub fn loading() -> Self {
        Self {
            kind: OverlayKind::Loading,
            theme: Theme::Light,
        }
    }

    /// 翻译结果
    pub fn translation(original: &str, translated: &str) -> Self {
        Self {
            kind: OverlayKind::Translation {
                original: original.to_string(),
                translated: translated.to_string(),
            },
            theme: Theme::Light,
        }
    }

    /// 解释结果
    pub fn explanation(original: &str, explanation: &str) -> Self {
        Self {
            kind: OverlayKind::Explanation {
                original: original.to_string(),
                explanation: explanation.to_string(),
            },
            theme: Theme::Light,
        }
    }

    /// 错误消息
    pub fn error(message: &str) -> Self {
        Self {
            kind: OverlayKind::Error {
                message: message.to_string(),
            },
            theme: Theme::Danger,
        }
    }

    /// 页面进度徽标
    pub fn progress(status: ProgressStatus) -> Self {
        let theme = match status {
            ProgressStatus::Running => Theme::Info,
            ProgressStatus::Complete => Theme::Success,
            ProgressStatus::Failed => Theme::Danger,
        };
        Self {
            kind: OverlayKind::PageProgress { status },
            theme,
        }
    }

    /// 该浮层的关闭规则
    pub fn dismissal(&self) -> Dismissal {
        match &self.kind {
            OverlayKind::Loading => Dismissal {
                close_button: false,
                outside_click: false,
                auto_dismiss: None,
            },
            OverlayKind::Translation { .. } | OverlayKind::Explanation { .. } => Dismissal {
                close_button: true,
                outside_click: true,
                auto_dismiss: None,
            },
            OverlayKind::Error { .. } => Dismissal {
                close_button: true,
                outside_click: true,
                auto_dismiss: Some(Duration::from_millis(overlay_config::ERROR_AUTO_DISMISS_MS)),
            },
            OverlayKind::PageProgress { status } => Dismissal {
                close_button: false,
                outside_click: false,
                auto_dismiss: match status {
                    ProgressStatus::Running => None,
                    _ => Some(Duration::from_millis(overlay_config::PROGRESS_AUTO_DISMISS_MS)),
                },
            },
        }
    }

    /// 用于终端和日志的纯文本渲染
    pub fn plain_text(&self) -> String {
        match &self.kind {
            OverlayKind::Loading => "Processing...".to_string(),
            OverlayKind::Translation {
                original,
                translated,
            } => format!("Original Text:\n{}\n\nTranslation:\n{}", original, translated),
            OverlayKind::Explanation {
                original,
                explanation,
            } => format!("Original Text:\n{}\n\nAI Explanation:\n{}", original, explanation),
            OverlayKind::Error { message } => format!("Error: {}", message),
            OverlayKind::PageProgress { status } => progress_label(*status).to_string(),
        }
    }
}

fn progress_label(status: ProgressStatus) -> &'static str {
    match status {
        ProgressStatus::Running => "Translating page...",
        ProgressStatus::Complete => "Translation complete!",
        ProgressStatus::Failed => "Translation failed!",
    }
}

fn theme_colors(theme: Theme) -> (&'static str, &'static str) {
    // (background, foreground)
    match theme {
        Theme::Light => ("#ffffff", "#202124"),
        Theme::Danger => ("#d93025", "#ffffff"),
        Theme::Info => ("#1a73e8", "#ffffff"),
        Theme::Success => ("#0b8043", "#ffffff"),
    }
}

/// 转义元素内容和属性值中的文本
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn labelled_block(label: &str, body: &str, background: &str, pre_wrap: bool) -> String {
    let white_space = if pre_wrap { " white-space: pre-wrap;" } else { "" };
    format!(
        "<div class=\"hinglish-label\">{}</div>\
         <div class=\"hinglish-text\" style=\"background: {}; padding: 10px; border-radius: 4px;{}\">{}</div>",
        escape_html(label),
        background,
        white_space,
        escape_html(body)
    )
}

/// 将浮层渲染为标记，相同浮层得到相同标记
pub fn render_overlay(overlay: &Overlay) -> String {
    let (background, foreground) = theme_colors(overlay.theme);
    let dismissal = overlay.dismissal();

    let (id, body) = match &overlay.kind {
        OverlayKind::Loading => (
            overlay_config::LOADING_OVERLAY_ID,
            "<div>Processing...</div><div class=\"loading-spinner\"></div>".to_string(),
        ),
        OverlayKind::Translation {
            original,
            translated,
        } => (
            "translationResultPopup",
            format!(
                "{}{}",
                labelled_block("Original Text:", original, "#f5f5f5", false),
                labelled_block("Translation:", translated, "#e8f0fe", false)
            ),
        ),
        OverlayKind::Explanation {
            original,
            explanation,
        } => (
            "translationResultPopup",
            format!(
                "{}{}",
                labelled_block("Original Text:", original, "#f5f5f5", false),
                labelled_block("AI Explanation:", explanation, "#e8f0fe", true)
            ),
        ),
        OverlayKind::Error { message } => (
            "translationErrorPopup",
            format!(
                "<div class=\"hinglish-label\">Error:</div><div>{}</div>",
                escape_html(message)
            ),
        ),
        OverlayKind::PageProgress { status } => (
            "translationProgress",
            escape_html(progress_label(*status)),
        ),
    };

    let close = if dismissal.close_button {
        "<button class=\"hinglish-close\" type=\"button\">Close</button>"
    } else {
        ""
    };

    format!(
        "<div id=\"{}\" class=\"hinglish-overlay\" style=\"position: fixed; z-index: 9999; \
         background-color: {}; color: {};\">{}{}</div>",
        id, background, foreground, body, close
    )
}

/// 已显示浮层的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(u64);

#[derive(Debug)]
struct ShownOverlay {
    id: OverlayId,
    overlay: Overlay,
    shown_at: Instant,
}

/// 页面上当前显示的浮层
#[derive(Debug, Default)]
pub struct OverlayLayer {
    next_id: u64,
    shown: Vec<ShownOverlay>,
}

impl OverlayLayer {
    /// 空图层
    pub fn new() -> Self {
        Self::default()
    }

    /// 立即显示浮层
    pub fn show(&mut self, overlay: Overlay) -> OverlayId {
        self.show_at(overlay, Instant::now())
    }

    /// 以 `now` 为时间点显示浮层
    pub fn show_at(&mut self, overlay: Overlay, now: Instant) -> OverlayId {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        debug!("showing overlay {:?}: {:?}", id, overlay.kind);
        self.shown.push(ShownOverlay {
            id,
            overlay,
            shown_at: now,
        });
        id
    }

    /// 替换已显示浮层的内容，计时从 `now` 重新开始
    pub fn update_at(&mut self, id: OverlayId, overlay: Overlay, now: Instant) -> bool {
        match self.shown.iter_mut().find(|shown| shown.id == id) {
            Some(shown) => {
                shown.overlay = overlay;
                shown.shown_at = now;
                true
            }
            None => false,
        }
    }

    /// 无视关闭规则移除浮层
    pub fn remove(&mut self, id: OverlayId) -> bool {
        let before = self.shown.len();
        self.shown.retain(|shown| shown.id != id);
        before != self.shown.len()
    }

    /// 点击关闭按钮，无关闭按钮的浮层忽略
    pub fn close(&mut self, id: OverlayId) -> bool {
        let closable = self
            .get(id)
            .map(|overlay| overlay.dismissal().close_button)
            .unwrap_or(false);
        closable && self.remove(id)
    }

    /// 点击所有浮层之外，返回关闭的数量
    pub fn click_outside(&mut self) -> usize {
        let before = self.shown.len();
        self.shown
            .retain(|shown| !shown.overlay.dismissal().outside_click);
        before - self.shown.len()
    }

    /// 移除在 `now` 时已到自动关闭时间的浮层
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.shown.len();
        self.shown.retain(|shown| match shown.overlay.dismissal().auto_dismiss {
            Some(delay) => now.saturating_duration_since(shown.shown_at) < delay,
            None => true,
        });
        before - self.shown.len()
    }

    /// 按id获取浮层
    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.shown
            .iter()
            .find(|shown| shown.id == id)
            .map(|shown| &shown.overlay)
    }

    /// 已显示的浮层，最早的在前
    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.shown.iter().map(|shown| &shown.overlay)
    }

    /// 是否显示了加载浮层
    pub fn is_loading(&self) -> bool {
        self.overlays()
            .any(|overlay| overlay.kind == OverlayKind::Loading)
    }

    /// 已显示浮层数量
    pub fn len(&self) -> usize {
        self.shown.len()
    }

    /// 是否没有任何浮层
    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }

    /// 所有已显示浮层的标记
    pub fn render(&self) -> String {
        self.overlays().map(render_overlay).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_translation_snapshot() {
        let markup = render_overlay(&Overlay::translation("Hello", "Namaste"));
        assert_eq!(
            markup,
            "<div id=\"translationResultPopup\" class=\"hinglish-overlay\" style=\"position: fixed; \
             z-index: 9999; background-color: #ffffff; color: #202124;\">\
             <div class=\"hinglish-label\">Original Text:</div>\
             <div class=\"hinglish-text\" style=\"background: #f5f5f5; padding: 10px; border-radius: 4px;\">Hello</div>\
             <div class=\"hinglish-label\">Translation:</div>\
             <div class=\"hinglish-text\" style=\"background: #e8f0fe; padding: 10px; border-radius: 4px;\">Namaste</div>\
             <button class=\"hinglish-close\" type=\"button\">Close</button></div>"
        );
    }

    #[test]
    fn test_render_escapes_content() {
        let markup = render_overlay(&Overlay::error("<script>alert('x')</script>"));
        assert!(!markup.contains("<script>"));
        assert!(markup.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(markup.contains("background-color: #d93025"));
    }

    #[test]
    fn test_loading_has_no_close_button() {
        let markup = render_overlay(&Overlay::loading());
        assert!(markup.contains("id=\"translationLoadingPopup\""));
        assert!(!markup.contains("hinglish-close"));
    }

    #[test]
    fn test_close_and_outside_click() {
        let mut layer = OverlayLayer::new();
        let loading = layer.show(Overlay::loading());
        let result = layer.show(Overlay::translation("a", "b"));

        assert!(!layer.close(loading));
        assert_eq!(layer.click_outside(), 1);
        assert!(layer.get(result).is_none());
        assert!(layer.is_loading());
        assert!(layer.remove(loading));
        assert!(layer.is_empty());
    }

    #[test]
    fn test_only_errors_time_out() {
        let start = Instant::now();
        let mut layer = OverlayLayer::new();
        let error = layer.show_at(Overlay::error("boom"), start);
        let result = layer.show_at(Overlay::explanation("a", "b"), start);

        assert_eq!(layer.sweep(start + Duration::from_millis(4999)), 0);
        assert_eq!(layer.sweep(start + Duration::from_secs(5)), 1);
        assert!(layer.get(error).is_none());
        assert_eq!(layer.sweep(start + Duration::from_secs(3600)), 0);
        assert!(layer.get(result).is_some());
    }

    #[test]
    fn test_progress_timer_restarts_on_update() {
        let start = Instant::now();
        let mut layer = OverlayLayer::new();
        let badge = layer.show_at(Overlay::progress(ProgressStatus::Running), start);
        assert_eq!(layer.sweep(start + Duration::from_secs(60)), 0);

        let finished = start + Duration::from_secs(60);
        assert!(layer.update_at(badge, Overlay::progress(ProgressStatus::Complete), finished));
        assert_eq!(layer.sweep(finished + Duration::from_millis(1999)), 0);
        assert_eq!(layer.sweep(finished + Duration::from_secs(2)), 1);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            Overlay::progress(ProgressStatus::Failed).plain_text(),
            "Translation failed!"
        );
        assert!(Overlay::explanation("q", "a")
            .plain_text()
            .contains("AI Explanation:\na"));
    }
}
