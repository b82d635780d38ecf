//! XML <-> `serde_json::Value` conversion.
//!
//! # Design
//! The remote appliance speaks Rails-style XML: typed leaves carry a `type`
//! attribute (`integer`, `float`, `decimal`, `boolean`, `array`), null leaves
//! carry `nil="true"`, and element names are dasherized. Decoding produces a
//! mapping whose single key is the root element name. Element and attribute
//! names are undasherized (`created-at` becomes `created_at`) at every depth,
//! so XML records carry the same keys as their JSON form. Repeated sibling
//! elements collapse into an array, other attributes become keys, and text
//! next to attributes lands under `__content__`. Encoding is the inverse
//! under a caller-chosen root element.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("malformed xml: {0}")]
pub struct XmlError(String);

fn undasherize(name: &str) -> String {
    name.replace('-', "_")
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| XmlError(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| XmlError(e.to_string()))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Self::default()
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError("more than one root element".into()));
    }
    *root = Some(node);
    Ok(())
}

/// Decode an XML document into `{root_name: value}`.
pub fn from_xml(xml: &str) -> Result<Value, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event().map_err(|e| XmlError(e.to_string()))? {
            Event::Start(start) => stack.push(Node::open(&start)?),
            Event::Empty(start) => {
                let node = Node::open(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| XmlError("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| XmlError(e.to_string()))?;
                match stack.last_mut() {
                    Some(node) => node.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(XmlError("text outside the root element".into())),
                }
            }
            Event::CData(data) => match stack.last_mut() {
                Some(node) => node.text.push_str(&String::from_utf8_lossy(&data)),
                None => return Err(XmlError("cdata outside the root element".into())),
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError("unclosed element at end of document".into()));
    }
    let root = root.ok_or_else(|| XmlError("document has no root element".into()))?;

    let mut map = Map::new();
    let name = undasherize(&root.name);
    map.insert(name, typecast(root));
    Ok(Value::Object(map))
}

fn typecast(node: Node) -> Value {
    if node.attr("nil") == Some("true") {
        return Value::Null;
    }
    let kind = node.attr("type").map(str::to_string);

    if kind.as_deref() == Some("array") {
        return Value::Array(node.children.into_iter().map(typecast).collect());
    }

    let extra_attrs: Vec<(String, String)> = node
        .attrs
        .into_iter()
        .filter(|(k, _)| k != "type" && k != "nil")
        .collect();

    if node.children.is_empty() {
        let leaf = typecast_leaf(kind.as_deref(), &node.text);
        if extra_attrs.is_empty() {
            return leaf;
        }
        let mut map: Map<String, Value> = extra_attrs
            .into_iter()
            .map(|(k, v)| (undasherize(&k), Value::String(v)))
            .collect();
        if !node.text.is_empty() {
            map.insert("__content__".to_string(), leaf);
        }
        return Value::Object(map);
    }

    let mut map: Map<String, Value> = extra_attrs
        .into_iter()
        .map(|(k, v)| (undasherize(&k), Value::String(v)))
        .collect();
    for child in node.children {
        let key = undasherize(&child.name);
        let value = typecast(child);
        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key, value);
            }
        }
    }
    Value::Object(map)
}

fn typecast_leaf(kind: Option<&str>, text: &str) -> Value {
    match kind {
        Some("integer") => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        Some("float") | Some("decimal") | Some("double") => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        Some("boolean") => match text.trim() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        Some(_) => Value::String(text.to_string()),
        None if text.is_empty() => Value::Null,
        None => Value::String(text.to_string()),
    }
}

/// Encode `value` as an XML document under `<root>`.
pub fn to_xml(root: &str, value: &Value) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| XmlError(e.to_string()))?;
    write_element(&mut writer, &element_name(root), value)?;
    String::from_utf8(writer.into_inner()).map_err(|e| XmlError(e.to_string()))
}

fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmlError> {
    writer.write_event(event).map_err(|e| XmlError(e.to_string()))
}

fn write_leaf(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    kind: Option<&str>,
    text: &str,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(name);
    if let Some(kind) = kind {
        start.push_attribute(("type", kind));
    }
    emit(writer, Event::Start(start))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<(), XmlError> {
    match value {
        Value::Null => {
            let mut start = BytesStart::new(name);
            start.push_attribute(("nil", "true"));
            emit(writer, Event::Empty(start))
        }
        Value::Bool(b) => write_leaf(writer, name, Some("boolean"), &b.to_string()),
        Value::Number(n) => {
            let kind = if n.is_f64() { "float" } else { "integer" };
            write_leaf(writer, name, Some(kind), &n.to_string())
        }
        Value::String(s) => write_leaf(writer, name, None, s),
        Value::Array(items) => {
            let mut start = BytesStart::new(name);
            start.push_attribute(("type", "array"));
            emit(writer, Event::Start(start))?;
            for item in items {
                write_element(writer, "item", item)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        Value::Object(map) => {
            emit(writer, Event::Start(BytesStart::new(name)))?;
            for (key, item) in map {
                write_element(writer, &element_name(key), item)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))
        }
    }
}
