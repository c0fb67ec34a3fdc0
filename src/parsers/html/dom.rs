use std::cell::RefCell;

use encoding_rs::UTF_8;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
///
/// 字节一律按 UTF-8 解码并去掉 BOM，无效字节序列被替换为 U+FFFD，不做字符集探测。
/// html5ever 会修复未闭合标签和无效实体，这一步不会失败。
pub fn html_to_dom(data: &[u8]) -> RcDom {
    let (text, _) = UTF_8.decode_with_bom_removal(data);

    parse_document(RcDom::default(), Default::default()).one(&*text)
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some((node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    let name_matches = matches!(node.data, NodeData::Element { ref name, .. } if &*name.local == *node_name);

    if name_matches && rest.is_empty() {
        found_nodes.push(node.clone());
    } else if name_matches {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, rest));
        }
        return found_nodes;
    }

    for child_node in node.children.borrow().iter() {
        found_nodes.append(&mut find_nodes(child_node, node_names));
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 设置节点属性
///
/// `None` 会删除该属性。
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 创建一个 HTML 元素节点（尚未挂到树上）
pub fn new_element(dom: &RcDom, tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: format_tendril!("{}", value),
        })
        .collect();

    create_element(dom, QualName::new(None, ns!(html), LocalName::from(tag)), attrs)
}

/// 创建一个文本节点
pub fn new_text_node(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

/// 将节点追加为最后一个子节点
pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(std::rc::Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// 将节点插入为第一个子节点
pub fn prepend_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(std::rc::Rc::downgrade(parent)));
    parent.children.borrow_mut().insert(0, child);
}

/// 检查元素的 class 属性是否包含全部给定类名
pub fn has_all_classes(node: &Handle, classes: &[&str]) -> bool {
    let Some(class_attr) = get_node_attr(node, "class") else {
        return false;
    };
    let present: Vec<&str> = class_attr.split_ascii_whitespace().collect();
    !classes.is_empty() && classes.iter().all(|class| present.contains(class))
}
