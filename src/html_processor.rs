//! HTML处理模块
//!
//! 负责解析、序列化，以及页面编排所依赖的文档顺序遍历。

// 标准库导入
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

// 第三方crate导入
use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::TendrilSink;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

// 本地模块导入
use crate::api_constants::page_config;
use crate::error::Result;
use crate::translation_error;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// 批量翻译选中的文本节点
#[derive(Debug, Clone)]
pub struct TextFragment {
    /// 文本节点
    pub node: Handle,
    /// 文本节点所属元素
    pub parent: Handle,
    /// 去除首尾空白后的文本
    pub text: String,
}

/// 解析HTML文档
pub fn parse_html(html: &str) -> Result<RcDom> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| translation_error!(html_parse, format!("{:?}", e)))
}

/// 将文档序列化为HTML
pub fn serialize_dom_to_html(dom: &RcDom) -> Result<String> {
    let mut buffer = Vec::new();
    let cursor = Cursor::new(&mut buffer);

    serialize(
        cursor,
        &SerializableHandle::from(dom.document.clone()),
        SerializeOpts::default(),
    )
    .map_err(|e| translation_error!(html_parse, format!("serialization failed: {:?}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| translation_error!(html_parse, format!("output is not UTF-8: {}", e)))
}

/// 元素节点的本地标签名
pub fn element_name(node: &Node) -> Option<&str> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 元素节点上的属性值
pub fn attribute(node: &Node, attr_name: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 元素的class列表是否包含 `class`
pub fn has_class(node: &Node, class: &str) -> bool {
    attribute(node, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// 向元素的class列表添加 `class`
pub fn add_class(node: &Node, class: &str) {
    let NodeData::Element { ref attrs, .. } = node.data else {
        return;
    };

    let mut attrs = attrs.borrow_mut();
    match attrs
        .iter_mut()
        .find(|attr| attr.name.local.as_ref() == "class")
    {
        Some(attr) => {
            if !attr.value.split_whitespace().any(|c| c == class) {
                let value = if attr.value.trim().is_empty() {
                    class.to_string()
                } else {
                    format!("{} {}", attr.value.trim(), class)
                };
                attr.value = value.into();
            }
        }
        None => attrs.push(Attribute {
            name: QualName::new(None, Namespace::from(""), LocalName::from("class")),
            value: class.into(),
        }),
    }
}

/// 把 `parent` 的文本子节点包进 `<span class="{class}">`
///
/// 文本节点本身移入span，已有句柄保持有效。`text_node` 不是 `parent` 的子节点时返回false。
pub fn wrap_text_in_marked_span(parent: &Handle, text_node: &Handle, class: &str) -> bool {
    let mut children = parent.children.borrow_mut();
    let Some(index) = children
        .iter()
        .position(|child| Rc::ptr_eq(child, text_node))
    else {
        return false;
    };

    let span = Node::new(NodeData::Element {
        name: QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("span")),
        attrs: RefCell::new(vec![Attribute {
            name: QualName::new(None, Namespace::from(""), LocalName::from("class")),
            value: class.into(),
        }]),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    });
    text_node.parent.set(Some(Rc::downgrade(&span)));
    span.children.borrow_mut().push(text_node.clone());
    span.parent.set(Some(Rc::downgrade(parent)));
    children[index] = span;
    true
}

/// 文本节点的内容
pub fn node_text(node: &Node) -> Option<String> {
    match node.data {
        NodeData::Text { ref contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 替换文本节点的内容
pub fn set_node_text(node: &Node, text: &str) {
    if let NodeData::Text { ref contents } = node.data {
        let mut content_ref = contents.borrow_mut();
        content_ref.clear();
        content_ref.push_slice(text);
    }
}

/// `node` 唯一的子节点为文本节点时返回它
pub fn single_text_child(node: &Node) -> Option<Handle> {
    let children = node.children.borrow();
    match children.as_slice() {
        [child] if matches!(child.data, NodeData::Text { .. }) => Some(child.clone()),
        _ => None,
    }
}

fn is_skipped_element(node: &Node) -> bool {
    element_name(node)
        .map(|name| page_config::SKIPPED_TAGS.contains(&name))
        .unwrap_or(false)
}

/// `node` 及其后代的拼接文本，跳过脚本类元素
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        if let Some(content) = node_text(&current) {
            text.push_str(&content);
            continue;
        }
        if is_skipped_element(&current) {
            continue;
        }
        for child in current.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    text
}

/// `root` 下的所有节点，按文档顺序（先序）
pub fn document_order(root: &Handle) -> Vec<Handle> {
    let mut nodes = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
        nodes.push(node);
    }
    nodes
}

/// 匹配简单选择器的元素：`tag`、`#id` 或 `.class`
pub fn select_elements(dom: &RcDom, selector: &str) -> Vec<Handle> {
    let selector = selector.trim();
    document_order(&dom.document)
        .into_iter()
        .filter(|node| {
            if element_name(node).is_none() {
                return false;
            }
            if let Some(id) = selector.strip_prefix('#') {
                attribute(node, "id").as_deref() == Some(id)
            } else if let Some(class) = selector.strip_prefix('.') {
                has_class(node, class)
            } else {
                element_name(node) == Some(selector)
            }
        })
        .collect()
}

/// 结构化模式候选元素，按文档顺序
///
/// 标签在 `tags` 中、唯一子节点为非空白文本节点且未带 `marker` 的元素入选。
pub fn structured_candidates(dom: &RcDom, tags: &[&str], marker: &str) -> Vec<Handle> {
    document_order(&dom.document)
        .into_iter()
        .filter(|node| {
            element_name(node)
                .map(|name| tags.contains(&name))
                .unwrap_or(false)
                && !has_class(node, marker)
                && single_text_child(node)
                    .and_then(|child| node_text(&child))
                    .map(|text| !text.trim().is_empty())
                    .unwrap_or(false)
        })
        .collect()
}

/// 文档的 `body` 元素（如果存在）
pub fn body_element(dom: &RcDom) -> Option<Handle> {
    document_order(&dom.document)
        .into_iter()
        .find(|node| element_name(node) == Some("body"))
}

/// `body` 下的批量模式文本片段，按文档顺序
///
/// 跳过空白文本节点、带 `marker` 的元素下的文本以及脚本类元素中的文本。
pub fn collect_text_fragments(dom: &RcDom, marker: &str) -> Vec<TextFragment> {
    let mut fragments = Vec::new();
    let root = body_element(dom).unwrap_or_else(|| dom.document.clone());
    // (node, parent element, inside a marked element)
    let mut stack: Vec<(Handle, Option<Handle>, bool)> = vec![(root, None, false)];

    while let Some((node, parent, marked)) = stack.pop() {
        match node.data {
            NodeData::Text { ref contents } => {
                let text = contents.borrow().trim().to_string();
                if marked || text.is_empty() {
                    continue;
                }
                if let Some(parent) = parent {
                    fragments.push(TextFragment {
                        node: node.clone(),
                        parent,
                        text,
                    });
                }
            }
            NodeData::Element { .. } => {
                if is_skipped_element(&node) {
                    continue;
                }
                let marked = marked || has_class(&node, marker);
                for child in node.children.borrow().iter().rev() {
                    stack.push((child.clone(), Some(node.clone()), marked));
                }
            }
            NodeData::Document => {
                for child in node.children.borrow().iter().rev() {
                    stack.push((child.clone(), None, marked));
                }
            }
            _ => {}
        }
    }

    fragments
}
