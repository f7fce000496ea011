//! 选区提取模块
//!
//! 直接取文本会把列表压成一行，因此列表项在发给模型前渲染为带项目符号的多行文本。

// 标准库导入
use std::sync::OnceLock;

// 第三方crate导入
use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;

// 本地模块导入
use crate::api_constants::page_config;
use crate::error::{Result, TranslationError};
use crate::html_processor::{element_name, node_text, text_content};

/// 渲染时另起一行的元素
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "h1", "h2", "h3", "h4",
    "h5", "h6", "li", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// 用户的选区
#[derive(Debug, Clone)]
pub enum Selection {
    /// 纯文本选区
    Text(String),
    /// 选中的节点，按文档顺序
    Nodes(Vec<Handle>),
}

fn whitespace_regex() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// 将连续空白压缩为单个空格并去除首尾空白
pub fn normalize_whitespace(text: &str) -> String {
    whitespace_regex().replace_all(text.trim(), " ").into_owned()
}

/// 发送给模型的文本，没有可用内容时返回 `NoSelection`
pub fn extract_selection_text(selection: &Selection) -> Result<String> {
    let text = match selection {
        Selection::Text(text) => text.trim().to_string(),
        Selection::Nodes(nodes) => {
            let items = list_items(nodes);
            if items.is_empty() {
                rendered_text(nodes)
            } else {
                items
                    .iter()
                    .map(|item| normalize_whitespace(&block_text(item)))
                    .filter(|line| !line.is_empty())
                    .map(|line| format!("{}{}", page_config::LIST_ITEM_PREFIX, line))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    };

    if text.is_empty() {
        Err(TranslationError::NoSelection)
    } else {
        Ok(text)
    }
}

/// `node` 的文本，在块级边界插入空格以分隔嵌套块
fn block_text(node: &Handle) -> String {
    let mut text = String::new();
    push_block_text(node, &mut text);
    text
}

fn push_block_text(node: &Handle, out: &mut String) {
    if let Some(content) = node_text(node) {
        out.push_str(&content);
        return;
    }
    let name = element_name(node);
    if name.is_some_and(|name| page_config::SKIPPED_TAGS.contains(&name)) {
        return;
    }

    let block = name.is_some_and(|name| BLOCK_TAGS.contains(&name));
    if block {
        out.push(' ');
    }
    for child in node.children.borrow().iter() {
        push_block_text(child, out);
    }
    if block {
        out.push(' ');
    }
}

/// 选中节点内或其下最外层的 `li` 元素
fn list_items(nodes: &[Handle]) -> Vec<Handle> {
    let mut items = Vec::new();
    for node in nodes {
        let mut stack = vec![node.clone()];
        while let Some(current) = stack.pop() {
            if element_name(&current) == Some("li") {
                items.push(current);
                continue;
            }
            for child in current.children.borrow().iter().rev() {
                stack.push(child.clone());
            }
        }
    }
    items
}

/// 每个选中节点一行，文本节点保持行内
fn rendered_text(nodes: &[Handle]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut inline = String::new();

    for node in nodes {
        match node.data {
            NodeData::Text { .. } => inline.push_str(&text_content(node)),
            _ => {
                let block = normalize_whitespace(&block_text(node));
                let pending = normalize_whitespace(&inline);
                if !pending.is_empty() {
                    lines.push(pending);
                }
                inline.clear();
                if !block.is_empty() {
                    lines.push(block);
                }
            }
        }
    }

    let pending = normalize_whitespace(&inline);
    if !pending.is_empty() {
        lines.push(pending);
    }
    lines.join("\n")
}
