//! XML-RPC value model, request encoding and response decoding.

use std::collections::BTreeMap;
use std::fmt::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{NaiveDateTime, TimeZone, Utc};
use xml::escape::escape_str_pcdata as escape;
use xml::reader::{EventReader, XmlEvent};

use wpsync_core::error::{SyncError, SyncResult};

const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";
const DATETIME_FORMATS: [&str; 3] = [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y%m%dT%H%M%S"];

/// An XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(String),
    Double(f64),
    DateTime(NaiveDateTime),
    Base64(Vec<u8>),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Nil,
}

impl Value {
    /// Build a struct value from key/value pairs
    pub fn structure<I, K>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Struct(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Struct member lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value; WordPress sends many IDs as numeric strings
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|i| u64::try_from(i).ok())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::String(s) => match s.trim() {
                "1" | "true" => Some(true),
                "0" | "false" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            Value::String(s) => parse_datetime(s).ok(),
            _ => None,
        }
    }

    /// Convert to JSON; dates become RFC 3339 UTC strings and binary data base64
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::DateTime(dt) => serde_json::Value::String(Utc.from_utc_datetime(dt).to_rfc3339()),
            Value::Base64(bytes) => serde_json::Value::String(STANDARD.encode(bytes)),
            Value::Array(values) => values.iter().map(Value::to_json).collect(),
            Value::Struct(members) => serde_json::Value::Object(
                members.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Nil => serde_json::Value::Null,
        }
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::Int(i) => {
                let _ = write!(out, "<int>{}</int>", i);
            }
            Value::Bool(b) => {
                let _ = write!(out, "<boolean>{}</boolean>", if *b { 1 } else { 0 });
            }
            Value::String(s) => {
                let _ = write!(out, "<string>{}</string>", escape(s.as_str()));
            }
            Value::Double(d) => {
                let _ = write!(out, "<double>{}</double>", d);
            }
            Value::DateTime(dt) => {
                let _ = write!(
                    out,
                    "<dateTime.iso8601>{}</dateTime.iso8601>",
                    dt.format(DATETIME_FORMAT)
                );
            }
            Value::Base64(bytes) => {
                let _ = write!(out, "<base64>{}</base64>", STANDARD.encode(bytes));
            }
            Value::Array(values) => {
                out.push_str("<array><data>");
                for value in values {
                    value.write_xml(out);
                }
                out.push_str("</data></array>");
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    let _ = write!(out, "<member><name>{}</name>", escape(name.as_str()));
                    value.write_xml(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
            Value::Nil => out.push_str("<nil/>"),
        }
        out.push_str("</value>");
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

/// Encode a `methodCall` document
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.write_xml(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Decode a `methodResponse` document; a `<fault>` becomes [`SyncError::Fault`]
pub fn decode_response(xml: &str) -> SyncResult<Value> {
    let root = parse_tree(xml)?;
    if root.name != "methodResponse" {
        return Err(SyncError::parse(format!(
            "Expected methodResponse, found <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let value = fault
            .child("value")
            .ok_or_else(|| SyncError::parse("Fault without a value"))?;
        return Err(fault_from_value(&decode_value(value)?));
    }

    let value = root
        .child("params")
        .and_then(|params| params.child("param"))
        .and_then(|param| param.child("value"))
        .ok_or_else(|| SyncError::parse("Response has no return value"))?;
    decode_value(value)
}

/// Turn a fault struct into an error
pub fn fault_from_value(value: &Value) -> SyncError {
    let code = value.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
    let message = value
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or("Unknown fault");
    SyncError::fault(code, message)
}

pub fn parse_datetime(text: &str) -> SyncResult<NaiveDateTime> {
    let text = text.trim().trim_end_matches('Z');
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| SyncError::parse(format!("Invalid dateTime.iso8601: {}", text)))
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn parse_tree(xml: &str) -> SyncResult<Node> {
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    for event in EventReader::from_str(xml) {
        let event = event.map_err(|e| SyncError::parse(format!("Malformed XML-RPC: {}", e)))?;
        match event {
            XmlEvent::StartElement { name, .. } => stack.push(Node::new(name.local_name)),
            XmlEvent::EndElement { .. } => {
                let node = stack
                    .pop()
                    .ok_or_else(|| SyncError::parse("Unbalanced closing tag"))?;
                attach(&mut stack, &mut root, node);
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) | XmlEvent::Whitespace(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            XmlEvent::EndDocument => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(SyncError::parse("Truncated XML-RPC document"));
    }
    root.ok_or_else(|| SyncError::parse("Empty XML-RPC document"))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

fn decode_value(node: &Node) -> SyncResult<Value> {
    // An untyped value is a string
    let Some(typed) = node.children.first() else {
        return Ok(Value::String(node.text.clone()));
    };
    let text = typed.text.as_str();

    match typed.name.as_str() {
        "i4" | "int" | "i8" => text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| SyncError::parse(format!("Invalid integer: {}", text))),
        "boolean" => match text.trim() {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(SyncError::parse(format!("Invalid boolean: {}", other))),
        },
        "string" => Ok(Value::String(text.to_string())),
        "double" => text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|_| SyncError::parse(format!("Invalid double: {}", text))),
        "dateTime.iso8601" => parse_datetime(text).map(Value::DateTime),
        "base64" => {
            let compact: String = text.split_whitespace().collect();
            STANDARD
                .decode(compact)
                .map(Value::Base64)
                .map_err(|e| SyncError::parse(format!("Invalid base64: {}", e)))
        }
        "array" => match typed.child("data") {
            Some(data) => data
                .children_named("value")
                .map(decode_value)
                .collect::<SyncResult<Vec<_>>>()
                .map(Value::Array),
            None => Ok(Value::Array(Vec::new())),
        },
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children_named("member") {
                let name = member
                    .child("name")
                    .ok_or_else(|| SyncError::parse("Struct member without a name"))?;
                let value = match member.child("value") {
                    Some(value) => decode_value(value)?,
                    None => Value::Nil,
                };
                members.insert(name.text.clone(), value);
            }
            Ok(Value::Struct(members))
        }
        "nil" => Ok(Value::Nil),
        other => Err(SyncError::parse(format!("Unknown XML-RPC type <{}>", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<methodResponse>\n  <params>\n    <param>\n      <value>{}</value>\n    </param>\n  </params>\n</methodResponse>\n",
            value
        )
    }

    #[test]
    fn test_encode_call() {
        let params = vec![
            Value::Int(1),
            Value::from("admin"),
            Value::from("p<ss&"),
            Value::structure([("show-supported", Value::from("1"))]),
        ];
        let xml = encode_call("wp.getPostFormats", &params);

        assert!(xml.starts_with("<?xml version=\"1.0\"?><methodCall><methodName>wp.getPostFormats</methodName>"));
        assert!(xml.contains("<param><value><int>1</int></value></param>"));
        assert!(xml.contains("<string>p&lt;ss&amp;</string>"));
        assert!(xml.contains(
            "<struct><member><name>show-supported</name><value><string>1</string></value></member></struct>"
        ));
        assert!(xml.ends_with("</params></methodCall>"));
    }

    #[test]
    fn test_decode_scalars() {
        let xml = response(
            "<struct>
              <member><name>count</name><value><i4>12</i4></value></member>
              <member><name>big</name><value><i8>9000000000</i8></value></member>
              <member><name>flag</name><value><boolean>1</boolean></value></member>
              <member><name>ratio</name><value><double>1.5</double></value></member>
              <member><name>plain</name><value>  untyped  </value></member>
              <member><name>title</name><value><string>Caf&#233; &amp; Bar</string></value></member>
              <member><name>created</name><value><dateTime.iso8601>20131101T10:20:30</dateTime.iso8601></value></member>
              <member><name>blob</name><value><base64>aGVs
              bG8=</base64></value></member>
              <member><name>nothing</name><value><nil/></value></member>
              <member><name>empty</name><value><string/></value></member>
            </struct>",
        );
        let value = decode_response(&xml).unwrap();

        assert_eq!(value.get("count"), Some(&Value::Int(12)));
        assert_eq!(value.get("big").and_then(Value::as_i64), Some(9_000_000_000));
        assert_eq!(value.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(value.get("ratio"), Some(&Value::Double(1.5)));
        assert_eq!(value.get("plain").and_then(Value::as_str), Some("  untyped  "));
        assert_eq!(value.get("title").and_then(Value::as_str), Some("Café & Bar"));
        assert_eq!(
            value.get("created").and_then(Value::as_datetime).map(|d| d.to_string()),
            Some("2013-11-01 10:20:30".to_string())
        );
        assert_eq!(value.get("blob"), Some(&Value::Base64(b"hello".to_vec())));
        assert_eq!(value.get("nothing"), Some(&Value::Nil));
        assert_eq!(value.get("empty").and_then(Value::as_str), Some(""));
    }

    #[test]
    fn test_decode_nested_collections() {
        let xml = response(
            "<array><data>
              <value><struct><member><name>term_id</name><value><string>7</string></value></member></struct></value>
              <value><array><data/></array></value>
              <value><array/></value>
            </data></array>",
        );
        let value = decode_response(&xml).unwrap();
        let items = value.as_array().unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].get("term_id").and_then(Value::as_u64), Some(7));
        assert_eq!(items[1], Value::Array(Vec::new()));
        assert_eq!(items[2], Value::Array(Vec::new()));
    }

    #[test]
    fn test_decode_fault() {
        let xml = "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>
            <member><name>faultCode</name><value><int>403</int></value></member>
            <member><name>faultString</name><value><string>Incorrect username or password.</string></value></member>
            </struct></value></fault></methodResponse>";

        match decode_response(xml) {
            Err(SyncError::Fault { code, message }) => {
                assert_eq!(code, 403);
                assert_eq!(message, "Incorrect username or password.");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_malformed_documents() {
        assert!(matches!(decode_response("<html><body>Not here</body></html>"), Err(SyncError::Parse(_))));
        assert!(matches!(decode_response(""), Err(SyncError::Parse(_))));
        assert!(decode_response("<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>").is_err());
        assert!(decode_response("<methodResponse><params><param><value><int>1</value>").is_err());
    }

    #[test]
    fn test_datetime_variants() {
        let expected = parse_datetime("20240102T03:04:05").unwrap();
        assert_eq!(parse_datetime("20240102T03:04:05Z").unwrap(), expected);
        assert_eq!(parse_datetime("2024-01-02T03:04:05").unwrap(), expected);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_to_json() {
        let value = Value::structure([
            ("list", Value::Array(vec![Value::Int(1), Value::from("two")])),
            ("when", Value::DateTime(parse_datetime("20240102T03:04:05").unwrap())),
        ]);
        let json = value.to_json();
        assert_eq!(json["list"][0], 1);
        assert_eq!(json["list"][1], "two");
        assert_eq!(json["when"], "2024-01-02T03:04:05+00:00");
    }
}
