use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// One entry of the inbound `messages` list. Fields other than these are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub id: Option<Value>,
    pub role: Option<Value>,
    pub content: Option<Value>,
    pub parts: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Value>,
    pub content: String,
}

impl Message {
    /// `None` when the entry is not a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };
        Some(Self {
            id: fields.remove("id"),
            role: fields.remove("role"),
            content: fields.remove("content"),
            parts: fields.remove("parts"),
        })
    }

    /// Non-null `parts` wins, even if empty.
    pub fn content_source(&self) -> Option<&Value> {
        self.parts
            .as_ref()
            .filter(|parts| !parts.is_null())
            .or(self.content.as_ref())
    }

    pub fn normalize(&self) -> NormalizedMessage {
        NormalizedMessage {
            role: self.role.clone(),
            content: normalize_content(self.content_source()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content<'a> {
    Absent,
    Text(&'a str),
    Blocks(Vec<ContentBlock<'a>>),
    /// A JSON object where a string or list was expected.
    Unrecognized(&'a Value),
    /// Numbers and booleans.
    Scalar,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock<'a> {
    Null,
    Plain(&'a str),
    /// `{type: "text", text}`; `None` when `text` is not a string.
    Text(Option<&'a str>),
    /// `{type: "input_text", content: {text}}`; `None` when `text` is not a string.
    InputText(Option<&'a str>),
    Unrecognized(&'a Value),
    Scalar,
}

impl<'a> Content<'a> {
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Content::Absent,
            Some(Value::String(s)) => Content::Text(s),
            Some(Value::Array(items)) => {
                Content::Blocks(items.iter().map(ContentBlock::classify).collect())
            }
            Some(v @ Value::Object(_)) => Content::Unrecognized(v),
            Some(Value::Bool(_)) | Some(Value::Number(_)) => Content::Scalar,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Content::Text(s) => s.to_owned(),
            Content::Absent | Content::Scalar => String::new(),
            Content::Unrecognized(v) => {
                report_unrecognized("content", v);
                String::new()
            }
            Content::Blocks(blocks) => blocks
                .into_iter()
                .map(ContentBlock::into_text)
                .filter(|chunk| !chunk.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl<'a> ContentBlock<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Null => ContentBlock::Null,
            Value::String(s) => ContentBlock::Plain(s),
            Value::Object(fields) => classify_object(value, fields),
            Value::Array(_) => ContentBlock::Unrecognized(value),
            Value::Bool(_) | Value::Number(_) => ContentBlock::Scalar,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ContentBlock::Plain(s) => s.to_owned(),
            ContentBlock::Text(text) | ContentBlock::InputText(text) => {
                text.map(str::to_owned).unwrap_or_default()
            }
            ContentBlock::Unrecognized(v) => {
                report_unrecognized("block", v);
                String::new()
            }
            ContentBlock::Null | ContentBlock::Scalar => String::new(),
        }
    }
}

fn classify_object<'a>(value: &'a Value, fields: &'a Map<String, Value>) -> ContentBlock<'a> {
    match fields.get("type").and_then(Value::as_str) {
        Some("text") => {
            if let Some(text) = fields.get("text") {
                return ContentBlock::Text(text.as_str());
            }
        }
        Some("input_text") => {
            let nested = fields
                .get("content")
                .and_then(Value::as_object)
                .and_then(|inner| inner.get("text"));
            if let Some(text) = nested {
                return ContentBlock::InputText(text.as_str());
            }
        }
        _ => {}
    }
    ContentBlock::Unrecognized(value)
}

fn report_unrecognized(shape: &'static str, value: &Value) {
    metrics::counter!("chat_relay_unrecognized_content_total", "shape" => shape).increment(1);
    warn!(shape, value = %value, "unexpected content format");
}

/// Flattens any content value into a string.
pub fn normalize_content(value: Option<&Value>) -> String {
    Content::classify(value).into_text()
}
