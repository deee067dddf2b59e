//! 排除选择器
//!
//! 排除区域以可注入的选择器列表表达。支持的语法是
//! CSS 的一个小子集：`tag`、`.class`、`[attr]`、`[attr="value"]` 以及它们的
//! 复合形式（如 `div.note[data-x="1"]`），多个选择器以逗号分隔。

use markup5ever_rcdom::Handle;

use crate::filter::error::{FilterError, FilterResult};
use crate::parsers::html::{ancestors, get_node_attr, get_node_name};

/// 属性条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrCondition {
    pub name: String,
    /// `None` 表示只要求属性存在
    pub value: Option<String>,
}

/// 单个复合选择器
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub tag: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrCondition>,
}

impl Selector {
    /// 解析单个复合选择器
    pub fn parse(input: &str) -> FilterResult<Self> {
        let source = input.trim();
        if source.is_empty() {
            return Err(FilterError::ParseError("空选择器".to_string()));
        }

        let mut selector = Selector::default();
        let mut rest = source;

        let tag_len = rest
            .find(|c: char| c == '.' || c == '[')
            .unwrap_or(rest.len());
        if tag_len > 0 {
            let tag = &rest[..tag_len];
            if tag != "*" {
                validate_ident(tag, source)?;
                selector.tag = Some(tag.to_ascii_lowercase());
            }
            rest = &rest[tag_len..];
        }

        while !rest.is_empty() {
            if let Some(after_dot) = rest.strip_prefix('.') {
                let len = after_dot
                    .find(|c: char| c == '.' || c == '[')
                    .unwrap_or(after_dot.len());
                let class = &after_dot[..len];
                validate_ident(class, source)?;
                selector.classes.push(class.to_string());
                rest = &after_dot[len..];
            } else if let Some(after_bracket) = rest.strip_prefix('[') {
                let close = after_bracket.find(']').ok_or_else(|| {
                    FilterError::ParseError(format!("选择器缺少 ']': {}", source))
                })?;
                selector.attrs.push(parse_attr(&after_bracket[..close], source)?);
                rest = &after_bracket[close + 1..];
            } else {
                return Err(FilterError::ParseError(format!(
                    "无法解析的选择器片段 '{}' in {}",
                    rest, source
                )));
            }
        }

        Ok(selector)
    }

    /// 判断元素是否匹配；非元素节点从不匹配
    pub fn matches(&self, node: &Handle) -> bool {
        let Some(name) = get_node_name(node) else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if !name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if !self.classes.is_empty() {
            let class_attr = get_node_attr(node, "class").unwrap_or_default();
            let has_all = self
                .classes
                .iter()
                .all(|wanted| class_attr.split_ascii_whitespace().any(|c| c == wanted));
            if !has_all {
                return false;
            }
        }

        self.attrs.iter().all(|cond| match get_node_attr(node, &cond.name) {
            Some(actual) => cond.value.as_ref().map_or(true, |v| *v == actual),
            None => false,
        })
    }
}

fn parse_attr(body: &str, source: &str) -> FilterResult<AttrCondition> {
    let (name, value) = match body.split_once('=') {
        Some((name, raw)) => {
            let raw = raw.trim();
            let unquoted = raw
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| raw.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(raw);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (body.trim(), None),
    };

    validate_ident(name, source)?;
    Ok(AttrCondition {
        name: name.to_ascii_lowercase(),
        value,
    })
}

fn validate_ident(ident: &str, source: &str) -> FilterResult<()> {
    let valid = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FilterError::ParseError(format!(
            "非法标识符 '{}' in {}",
            ident, source
        )))
    }
}

/// 排除规则集合
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExclusionRules {
    selectors: Vec<Selector>,
}

impl ExclusionRules {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    /// 解析逗号分隔的选择器串
    pub fn parse(list: &str) -> FilterResult<Self> {
        let selectors = list
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Selector::parse)
            .collect::<FilterResult<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// 解析选择器列表，每项自身也可包含逗号
    pub fn parse_list<S: AsRef<str>>(items: &[S]) -> FilterResult<Self> {
        let mut selectors = Vec::new();
        for item in items {
            selectors.extend(Self::parse(item.as_ref())?.selectors);
        }
        Ok(Self { selectors })
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// 节点自身是否被排除
    pub fn matches(&self, node: &Handle) -> bool {
        self.selectors.iter().any(|s| s.matches(node))
    }

    /// 是否存在被排除的祖先节点
    pub fn has_excluded_ancestor(&self, node: &Handle) -> bool {
        ancestors(node).iter().any(|ancestor| self.matches(ancestor))
    }

    /// 节点自身或任一祖先被排除
    pub fn is_excluded(&self, node: &Handle) -> bool {
        self.matches(node) || self.has_excluded_ancestor(node)
    }
}
