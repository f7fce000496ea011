//! 用户操作模块
//!
//! 每次翻译/解释触发都是一个独立的 [`Invocation`]，状态流转为
//! `Idle -> Loading -> Done | ErrorShown`。同时进行的多个操作互不协调。

// 标准库导入
use std::sync::atomic::{AtomicU64, Ordering};

// 第三方crate导入
use tracing::{debug, info, warn};

// 本地模块导入
use crate::messaging::TranslationBackend;
use crate::overlay::{Overlay, OverlayId, OverlayLayer};
use crate::selection::{extract_selection_text, Selection};
use crate::types::{Mode, TranslationResult};

static NEXT_INVOCATION: AtomicU64 = AtomicU64::new(1);

/// 一次调用所处的生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    /// 尚未开始
    Idle,
    /// 请求进行中，显示加载浮层
    Loading,
    /// 已显示结果浮层
    Done,
    /// 已显示错误浮层
    ErrorShown,
}

/// 一次翻译或解释操作
#[derive(Debug)]
pub struct Invocation {
    id: u64,
    mode: Mode,
    state: ActionState,
    loading: Option<OverlayId>,
    shown: Option<OverlayId>,
}

impl Invocation {
    /// 创建空闲状态的调用
    pub fn new(mode: Mode) -> Self {
        Self {
            id: NEXT_INVOCATION.fetch_add(1, Ordering::Relaxed),
            mode,
            state: ActionState::Idle,
            loading: None,
            shown: None,
        }
    }

    /// 当前状态
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// 操作模式
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// 结束时显示的结果或错误浮层
    pub fn shown_overlay(&self) -> Option<OverlayId> {
        self.shown
    }

    /// `Idle -> Loading`，其他状态忽略触发并返回false
    pub fn begin(&mut self, layer: &mut OverlayLayer) -> bool {
        if self.state != ActionState::Idle {
            debug!("invocation {} ignored trigger in {:?}", self.id, self.state);
            return false;
        }
        self.loading = Some(layer.show(Overlay::loading()));
        self.state = ActionState::Loading;
        true
    }

    /// `Loading -> Done | ErrorShown`：用结果替换加载浮层
    pub fn finish(
        &mut self,
        layer: &mut OverlayLayer,
        original: &str,
        result: &TranslationResult,
    ) -> Option<OverlayId> {
        if self.state != ActionState::Loading {
            warn!("invocation {} cannot finish from {:?}", self.id, self.state);
            return None;
        }
        if let Some(loading) = self.loading.take() {
            layer.remove(loading);
        }

        let (overlay, state) = match (result, self.mode) {
            (TranslationResult::Success { text }, Mode::Translate) => {
                (Overlay::translation(original, text), ActionState::Done)
            }
            (TranslationResult::Success { text }, Mode::Explain) => {
                (Overlay::explanation(original, text), ActionState::Done)
            }
            (TranslationResult::Failure { reason }, _) => {
                (Overlay::error(reason), ActionState::ErrorShown)
            }
        };

        let id = layer.show(overlay);
        self.state = state;
        self.shown = Some(id);
        Some(id)
    }
}

/// 针对 `backend` 完整执行一次选区操作
pub async fn run_selection_action(
    backend: &dyn TranslationBackend,
    layer: &mut OverlayLayer,
    mode: Mode,
    selection: &Selection,
) -> Invocation {
    let mut invocation = Invocation::new(mode);
    invocation.begin(layer);

    let (original, result) = match extract_selection_text(selection) {
        Ok(text) => {
            let result = backend.request(mode, &text).await;
            (text, result)
        }
        Err(e) => (String::new(), TranslationResult::from(e)),
    };

    invocation.finish(layer, &original, &result);
    info!(
        "{} action {} ended in {:?}",
        mode.as_str(),
        invocation.id,
        invocation.state
    );
    invocation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::BackgroundService;
    use crate::config::TranslatorConfig;
    use crate::overlay::{render_overlay, OverlayKind};
    use crate::settings::MemorySettingsStore;
    use crate::test_support::{MockEndpoint, ScriptedBackend};
    use crate::translator::Dispatcher;
    use std::sync::Arc;

    #[test]
    fn test_repeated_trigger_is_ignored() {
        let mut layer = OverlayLayer::new();
        let mut invocation = Invocation::new(Mode::Translate);
        assert!(invocation.begin(&mut layer));
        assert!(!invocation.begin(&mut layer));
        assert_eq!(layer.len(), 1);
        assert_eq!(invocation.state(), ActionState::Loading);
    }

    #[test]
    fn test_finish_requires_loading() {
        let mut layer = OverlayLayer::new();
        let mut invocation = Invocation::new(Mode::Explain);
        assert!(invocation
            .finish(&mut layer, "x", &TranslationResult::success("y"))
            .is_none());
        assert_eq!(invocation.state(), ActionState::Idle);

        invocation.begin(&mut layer);
        invocation.finish(&mut layer, "x", &TranslationResult::success("y"));
        assert_eq!(invocation.state(), ActionState::Done);
        assert!(invocation
            .finish(&mut layer, "x", &TranslationResult::failure("late"))
            .is_none());
        assert_eq!(invocation.state(), ActionState::Done);
    }

    #[tokio::test]
    async fn test_failure_shows_error_overlay() {
        let backend = ScriptedBackend::new(vec![TranslationResult::failure("rate limited")]);
        let mut layer = OverlayLayer::new();

        let invocation = run_selection_action(
            &backend,
            &mut layer,
            Mode::Translate,
            &Selection::Text("Hello".into()),
        )
        .await;

        assert_eq!(invocation.state(), ActionState::ErrorShown);
        assert!(!layer.is_loading());
        let overlay = layer.get(invocation.shown_overlay().unwrap()).unwrap();
        assert_eq!(
            overlay.kind,
            OverlayKind::Error {
                message: "rate limited".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_selection_makes_no_request() {
        let backend = ScriptedBackend::default();
        let mut layer = OverlayLayer::new();

        let invocation = run_selection_action(
            &backend,
            &mut layer,
            Mode::Explain,
            &Selection::Text("   ".into()),
        )
        .await;

        assert_eq!(invocation.state(), ActionState::ErrorShown);
        assert_eq!(backend.call_count(), 0);
        assert!(layer.render().contains("no selection"));
    }

    #[tokio::test]
    async fn test_concurrent_invocations_are_independent() {
        let mut layer = OverlayLayer::new();
        let mut first = Invocation::new(Mode::Translate);
        let mut second = Invocation::new(Mode::Explain);
        first.begin(&mut layer);
        second.begin(&mut layer);
        assert_eq!(layer.len(), 2);

        first.finish(&mut layer, "a", &TranslationResult::success("b"));
        assert!(layer.is_loading());
        assert_eq!(second.state(), ActionState::Loading);
    }

    #[tokio::test]
    async fn test_selection_translate_end_to_end() {
        let endpoint = MockEndpoint::completion(200, "Hello, kaise ho?").await;
        let dispatcher = Dispatcher::new(
            TranslatorConfig::new().with_api_url(&endpoint.url()),
            Arc::new(MemorySettingsStore::with_api_key("gsk_test")),
        )
        .unwrap();
        let (messenger, _handle) = BackgroundService::new(dispatcher).spawn();
        let mut layer = OverlayLayer::new();

        let invocation = run_selection_action(
            &messenger,
            &mut layer,
            Mode::Translate,
            &Selection::Text("Hello, how are you?".into()),
        )
        .await;

        assert_eq!(invocation.state(), ActionState::Done);
        assert!(!layer.is_loading());
        assert_eq!(layer.len(), 1);

        let overlay = layer.get(invocation.shown_overlay().unwrap()).unwrap();
        assert_eq!(
            overlay,
            &Overlay::translation("Hello, how are you?", "Hello, kaise ho?")
        );
        let markup = render_overlay(overlay);
        assert!(markup.contains("Hello, how are you?"));
        assert!(markup.contains("Hello, kaise ho?"));
        assert!(!layer.render().contains("translationLoadingPopup"));
        assert_eq!(endpoint.hits(), 1);
    }
}
