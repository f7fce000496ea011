//! 跨上下文消息模块
//!
//! 上下文之间不共享引用。请求以 [`Command`] 的形式装在 [`Envelope`] 里经有界 mpsc 通道发送，
//! 应答通过 oneshot 通道返回。JSON 线格式中命令按 `action` 标记，文本应答是普通字符串，
//! 请求失败时带错误前缀。

// 第三方crate导入
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

// 本地模块导入
use crate::api_constants::error_messages;
use crate::error::Result;
use crate::translation_error;
use crate::types::{Mode, TranslationResult};

/// 上下文可接收的所有消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// 翻译 `text`，以文本应答
    TranslateText {
        /// 待翻译文本
        text: String,
    },
    /// 解释 `text`，以文本应答
    ExplainText {
        /// 待解释文本
        text: String,
    },
    /// 翻译整个页面，不等待结果
    TranslatePage,
}

impl Command {
    /// `mode` 对应的文本命令
    pub fn for_text(mode: Mode, text: &str) -> Self {
        match mode {
            Mode::Translate => Command::TranslateText {
                text: text.to_string(),
            },
            Mode::Explain => Command::ExplainText {
                text: text.to_string(),
            },
        }
    }

    /// 消息中的动作名称
    pub fn action(&self) -> &'static str {
        match self {
            Command::TranslateText { .. } => "translateText",
            Command::ExplainText { .. } => "explainText",
            Command::TranslatePage => "translatePage",
        }
    }
}

/// [`Command`] 的应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 文本命令的结果
    Result {
        /// 原始命令的模式
        mode: Mode,
        /// 结果
        result: TranslationResult,
    },
    /// 命令已接受，无内容返回
    Ack,
}

impl Reply {
    /// 回传的字符串；不等待结果的命令为 `None`
    pub fn wire_text(&self) -> Option<String> {
        match self {
            Reply::Result {
                result: TranslationResult::Success { text },
                ..
            } => Some(text.clone()),
            Reply::Result {
                mode,
                result: TranslationResult::Failure { reason },
            } => {
                let prefix = match mode {
                    Mode::Translate => error_messages::TRANSLATION_ERROR_PREFIX,
                    Mode::Explain => error_messages::EXPLANATION_ERROR_PREFIX,
                };
                Some(format!("{}{}", prefix, reason))
            }
            Reply::Ack => None,
        }
    }
}

/// 命令及其回复通道
#[derive(Debug)]
pub struct Envelope {
    /// 命令
    pub command: Command,
    reply_to: Option<oneshot::Sender<Reply>>,
}

impl Envelope {
    /// 应答发送方，发送方已不再等待时忽略
    pub fn respond(&mut self, reply: Reply) {
        if let Some(reply_to) = self.reply_to.take() {
            if reply_to.send(reply).is_err() {
                debug!("{} reply dropped: sender is gone", self.command.action());
            }
        }
    }
}

/// 上下文收件箱的发送端
#[derive(Debug, Clone)]
pub struct Messenger {
    context: &'static str,
    tx: mpsc::Sender<Envelope>,
}

/// 上下文收件箱的接收端
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::Receiver<Envelope>,
}

/// 为名为 `context` 的上下文创建收件箱
pub fn channel(context: &'static str, capacity: usize) -> (Messenger, Inbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Messenger { context, tx }, Inbox { rx })
}

impl Messenger {
    /// 发送并等待应答
    pub async fn send_message(&self, command: Command) -> Result<Reply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let action = command.action();
        self.tx
            .send(Envelope {
                command,
                reply_to: Some(reply_tx),
            })
            .await
            .map_err(|_| translation_error!(channel, format!("{} context stopped", self.context)))?;

        reply_rx.await.map_err(|_| {
            translation_error!(
                channel,
                format!("{} context dropped the {} request", self.context, action)
            )
        })
    }

    /// 发送但不等待应答
    pub async fn post(&self, command: Command) -> Result<()> {
        self.tx
            .send(Envelope {
                command,
                reply_to: None,
            })
            .await
            .map_err(|_| translation_error!(channel, format!("{} context stopped", self.context)))
    }
}

impl Inbox {
    /// 下一条消息；所有发送端丢弃后为 `None`
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

/// 页面侧代码发送翻译/解释请求的接口
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// 请求翻译或解释 `text`
    async fn request(&self, mode: Mode, text: &str) -> TranslationResult;
}

#[async_trait]
impl TranslationBackend for Messenger {
    async fn request(&self, mode: Mode, text: &str) -> TranslationResult {
        match self.send_message(Command::for_text(mode, text)).await {
            Ok(Reply::Result { result, .. }) => result,
            Ok(Reply::Ack) => TranslationResult::failure("request was acknowledged without a result"),
            Err(e) => e.into(),
        }
    }
}

/// 解析一条JSON命令
pub fn parse_command(json: &str) -> Result<Command> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_shape() {
        let command = parse_command(r#"{"action":"translateText","text":"Hello"}"#).unwrap();
        assert_eq!(
            command,
            Command::TranslateText {
                text: "Hello".to_string()
            }
        );
        assert_eq!(
            parse_command(r#"{"action":"translatePage"}"#).unwrap(),
            Command::TranslatePage
        );
        assert_eq!(
            serde_json::to_value(Command::for_text(Mode::Explain, "x")).unwrap(),
            serde_json::json!({"action": "explainText", "text": "x"})
        );
        assert!(parse_command(r#"{"action":"deletePage"}"#).is_err());
    }

    #[test]
    fn test_reply_wire_text() {
        let ok = Reply::Result {
            mode: Mode::Translate,
            result: TranslationResult::success("kaise ho?"),
        };
        assert_eq!(ok.wire_text().as_deref(), Some("kaise ho?"));

        let failed = Reply::Result {
            mode: Mode::Translate,
            result: TranslationResult::failure("missing credential"),
        };
        assert_eq!(
            failed.wire_text().as_deref(),
            Some("Translation error: missing credential")
        );

        let failed = Reply::Result {
            mode: Mode::Explain,
            result: TranslationResult::failure("rate limited"),
        };
        assert_eq!(
            failed.wire_text().as_deref(),
            Some("Explanation error: rate limited")
        );
        assert_eq!(Reply::Ack.wire_text(), None);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (messenger, mut inbox) = channel("test", 4);
        let responder = tokio::spawn(async move {
            let mut envelope = inbox.recv().await.unwrap();
            assert_eq!(envelope.command.action(), "translateText");
            envelope.respond(Reply::Result {
                mode: Mode::Translate,
                result: TranslationResult::success("namaste"),
            });
        });

        let result = messenger.request(Mode::Translate, "hello").await;
        assert_eq!(result, TranslationResult::success("namaste"));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_request_is_a_failure() {
        let (messenger, mut inbox) = channel("test", 4);
        tokio::spawn(async move {
            // 不应答直接丢弃
            let _ = inbox.recv().await;
        });

        let result = messenger.request(Mode::Translate, "hello").await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_stopped_context() {
        let (messenger, inbox) = channel("background", 1);
        drop(inbox);
        assert!(messenger.post(Command::TranslatePage).await.is_err());
    }
}
