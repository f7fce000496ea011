//! 测试辅助：本地聊天补全端点和脚本化后端。
//! 仅在测试中编译。

// 标准库导入
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// 第三方crate导入
use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

// 本地模块导入
use crate::messaging::TranslationBackend;
use crate::types::{Mode, TranslationResult};

/// 模拟端点的共享状态
struct EndpointState {
    status: StatusCode,
    body: Value,
    hits: AtomicUsize,
    last_request: Mutex<Option<(Option<String>, Value)>>,
}

/// 监听本地临时端口的聊天补全端点
pub struct MockEndpoint {
    url: String,
    state: Arc<EndpointState>,
}

impl MockEndpoint {
    /// 对每个请求都以 `status` 和 `body` 应答的端点
    pub async fn respond(status: u16, body: Value) -> Self {
        let state = Arc::new(EndpointState {
            status: StatusCode::from_u16(status).expect("valid status"),
            body,
            hits: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock endpoint");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{}/v1/chat/completions", addr),
            state,
        }
    }

    /// 以固定生成内容 `content` 应答的端点
    pub async fn completion(status: u16, content: &str) -> Self {
        Self::respond(
            status,
            json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]}),
        )
        .await
    }

    /// 端点URL
    pub fn url(&self) -> String {
        self.url.clone()
    }

    /// 已收到的请求数
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// 最后一个请求的Authorization头和JSON体
    pub fn last_request(&self) -> Option<(Option<String>, Value)> {
        self.state.last_request.lock().expect("lock").clone()
    }
}

async fn completions(
    State(state): State<Arc<EndpointState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    *state.last_request.lock().expect("lock") = Some((auth, body));
    (state.status, Json(state.body.clone()))
}

/// 按脚本回放结果并记录请求的后端
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<TranslationResult>>,
    calls: Mutex<Vec<(Mode, String)>>,
}

impl ScriptedBackend {
    /// 按顺序以 `replies` 应答的后端，多余调用失败
    pub fn new(replies: Vec<TranslationResult>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 以 `texts` 成功应答的后端
    pub fn succeeding(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|text| TranslationResult::success(text))
                .collect(),
        )
    }

    /// 已收到的请求，按顺序
    pub fn calls(&self) -> Vec<(Mode, String)> {
        self.calls.lock().expect("lock").clone()
    }

    /// 已收到的请求数量
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }
}

#[async_trait]
impl TranslationBackend for ScriptedBackend {
    async fn request(&self, mode: Mode, text: &str) -> TranslationResult {
        self.calls
            .lock()
            .expect("lock")
            .push((mode, text.to_string()));
        self.replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| TranslationResult::failure("no scripted reply"))
    }
}
