//! 后台上下文模块
//!
//! 持有 [`Dispatcher`]，按到达顺序逐条处理其他上下文发来的命令。
//! 整页命令在挂接了页面上下文时转发给页面。

// 第三方crate导入
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// 本地模块导入
use crate::messaging::{channel, Command, Inbox, Messenger, Reply};
use crate::translator::Dispatcher;
use crate::types::Mode;

/// 后台上下文收件箱容量
const BACKGROUND_INBOX_CAPACITY: usize = 32;

/// 后台上下文的消息处理器
pub struct BackgroundService {
    dispatcher: Dispatcher,
    page: Option<Messenger>,
}

impl BackgroundService {
    /// 创建未关联页面的服务
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            page: None,
        }
    }

    /// 关联接收 `translatePage` 的页面上下文
    pub fn with_page(mut self, page: Messenger) -> Self {
        self.page = Some(page);
        self
    }

    /// 处理一条命令
    pub async fn handle_command(&self, command: Command) -> Reply {
        match command {
            Command::TranslateText { text } => Reply::Result {
                mode: Mode::Translate,
                result: self.dispatcher.handle(Mode::Translate, &text).await,
            },
            Command::ExplainText { text } => Reply::Result {
                mode: Mode::Explain,
                result: self.dispatcher.handle(Mode::Explain, &text).await,
            },
            Command::TranslatePage => {
                match &self.page {
                    Some(page) => {
                        if let Err(e) = page.post(Command::TranslatePage).await {
                            warn!("could not relay translatePage: {}", e);
                        }
                    }
                    None => warn!("translatePage received but no page is attached"),
                }
                Reply::Ack
            }
        }
    }

    /// 持续处理 `inbox`，直到所有发送端被丢弃
    pub async fn run(self, mut inbox: Inbox) {
        info!("background context started");
        while let Some(mut envelope) = inbox.recv().await {
            debug!("background received {}", envelope.command.action());
            let reply = self.handle_command(envelope.command.clone()).await;
            envelope.respond(reply);
        }
        info!("background context stopped");
    }

    /// 在新任务上运行并返回其发送端
    pub fn spawn(self) -> (Messenger, JoinHandle<()>) {
        let (messenger, inbox) = channel("background", BACKGROUND_INBOX_CAPACITY);
        let handle = tokio::spawn(self.run(inbox));
        (messenger, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslatorConfig;
    use crate::messaging::TranslationBackend;
    use crate::settings::MemorySettingsStore;
    use crate::test_support::MockEndpoint;
    use crate::types::TranslationResult;
    use std::sync::Arc;

    fn service(url: &str, store: MemorySettingsStore) -> BackgroundService {
        let dispatcher =
            Dispatcher::new(TranslatorConfig::new().with_api_url(url), Arc::new(store)).unwrap();
        BackgroundService::new(dispatcher)
    }

    #[tokio::test]
    async fn test_translate_text_over_channel() {
        let endpoint = MockEndpoint::completion(200, "Hello, kaise ho?").await;
        let (messenger, handle) =
            service(&endpoint.url(), MemorySettingsStore::with_api_key("gsk_test")).spawn();

        let reply = messenger
            .send_message(Command::TranslateText {
                text: "Hello, how are you?".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(reply.wire_text().as_deref(), Some("Hello, kaise ho?"));

        drop(messenger);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_credential_wire_text() {
        let endpoint = MockEndpoint::completion(200, "unused").await;
        let (messenger, _handle) = service(&endpoint.url(), MemorySettingsStore::new()).spawn();

        let reply = messenger
            .send_message(Command::ExplainText {
                text: "photosynthesis".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            reply.wire_text().as_deref(),
            Some("Explanation error: missing credential")
        );
        assert_eq!(endpoint.hits(), 0);

        let result = messenger.request(Mode::Translate, "hi").await;
        assert_eq!(result, TranslationResult::failure("missing credential"));
    }

    #[tokio::test]
    async fn test_translate_page_is_relayed() {
        let endpoint = MockEndpoint::completion(200, "unused").await;
        let (page, mut page_inbox) = channel("page", 4);
        let (messenger, _handle) =
            service(&endpoint.url(), MemorySettingsStore::with_api_key("gsk_test"))
                .with_page(page)
                .spawn();

        let reply = messenger.send_message(Command::TranslatePage).await.unwrap();
        assert_eq!(reply, Reply::Ack);

        let relayed = page_inbox.recv().await.unwrap();
        assert_eq!(relayed.command, Command::TranslatePage);
        assert_eq!(endpoint.hits(), 0);
    }
}
