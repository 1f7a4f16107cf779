//! XML-RPC document encoding and decoding.
//!
//! Requests are written directly as text (the format is small and fixed);
//! replies are read with `quick-xml`'s pull parser. Text is always UTF-8.
//!
//! Supported value types: `int`/`i4`, `boolean`, `string` (and untyped text
//! inside `<value>`), `double`, `dateTime.iso8601`, `base64`, `struct`,
//! `array` and the `nil` extension.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::NaiveDateTime;
use controller::{RemoteError, Value, DATE_TIME_FORMAT};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{CodecError, Result};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Alternate `dateTime.iso8601` layout some servers emit.
const DATE_TIME_FORMAT_DASHED: &str = "%Y-%m-%dT%H:%M:%S";

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A decoded `<methodCall>`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub params: Vec<Value>,
}

/// A decoded `<methodResponse>`: either a single value or a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Fault { code: i32, message: String },
}

impl MethodResponse {
    /// Converts a fault into [`RemoteError::Fault`], leaving success values as-is.
    pub fn into_result(self) -> std::result::Result<Value, RemoteError> {
        match self {
            MethodResponse::Success(value) => Ok(value),
            MethodResponse::Fault { code, message } => Err(RemoteError::Fault { code, message }),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes a `<methodCall>` with the parameters in the given order.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECLARATION);
    out.push_str("<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Encodes a successful `<methodResponse>` carrying `value`.
pub fn encode_response(value: &Value) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECLARATION);
    out.push_str("<methodResponse><params><param>");
    write_value(&mut out, value);
    out.push_str("</param></params></methodResponse>");
    out
}

/// Encodes a fault `<methodResponse>`.
pub fn encode_fault(code: i32, message: &str) -> String {
    let mut members = BTreeMap::new();
    members.insert("faultCode".to_owned(), Value::Int(code));
    members.insert("faultString".to_owned(), Value::String(message.to_owned()));

    let mut out = String::with_capacity(256);
    out.push_str(XML_DECLARATION);
    out.push_str("<methodResponse><fault>");
    write_value(&mut out, &Value::Struct(members));
    out.push_str("</fault></methodResponse>");
    out
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Int(n) => out.push_str(&format!("<int>{n}</int>")),
        Value::Boolean(b) => out.push_str(if *b {
            "<boolean>1</boolean>"
        } else {
            "<boolean>0</boolean>"
        }),
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Double(d) => out.push_str(&format!("<double>{d}</double>")),
        Value::DateTime(dt) => out.push_str(&format!(
            "<dateTime.iso8601>{}</dateTime.iso8601>",
            dt.format(DATE_TIME_FORMAT)
        )),
        Value::Base64(bytes) => {
            out.push_str("<base64>");
            out.push_str(&BASE64.encode(bytes));
            out.push_str("</base64>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Nil => out.push_str("<nil/>"),
    }
    out.push_str("</value>");
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes a `<methodResponse>` document.
pub fn decode_response(xml: &str) -> Result<MethodResponse> {
    let mut parser = Parser::new(xml);
    parser.expect_start("methodResponse")?;

    let response = match parser.next_significant()? {
        Token::Start(tag) if tag == "params" => {
            parser.expect_start("param")?;
            let value = parser.value()?;
            parser.expect_end("param")?;
            parser.expect_end("params")?;
            MethodResponse::Success(value)
        }
        Token::Empty(tag) if tag == "params" => MethodResponse::Success(Value::Nil),
        Token::Start(tag) if tag == "fault" => {
            let value = parser.value()?;
            parser.expect_end("fault")?;
            fault_from(value)?
        }
        other => return Err(unexpected("<params> or <fault>", &other)),
    };

    parser.expect_end("methodResponse")?;
    Ok(response)
}

/// Decodes a `<methodCall>` document.
pub fn decode_call(xml: &str) -> Result<MethodCall> {
    let mut parser = Parser::new(xml);
    parser.expect_start("methodCall")?;
    parser.expect_start("methodName")?;
    let method = parser.text_until("methodName")?.trim().to_owned();

    let mut params = Vec::new();
    match parser.next_significant()? {
        Token::Start(tag) if tag == "params" => loop {
            match parser.next_significant()? {
                Token::Start(tag) if tag == "param" => {
                    params.push(parser.value()?);
                    parser.expect_end("param")?;
                }
                Token::End(tag) if tag == "params" => break,
                other => return Err(unexpected("<param> or </params>", &other)),
            }
        },
        Token::Empty(tag) if tag == "params" => {}
        Token::End(tag) if tag == "methodCall" => return Ok(MethodCall { method, params }),
        other => return Err(unexpected("<params>", &other)),
    }

    parser.expect_end("methodCall")?;
    Ok(MethodCall { method, params })
}

fn fault_from(value: Value) -> Result<MethodResponse> {
    let members = value
        .into_struct()
        .map_err(|_| CodecError::InvalidFault("struct"))?;
    let code = members
        .get("faultCode")
        .and_then(Value::as_i32)
        .ok_or(CodecError::InvalidFault("faultCode"))?;
    let message = members
        .get("faultString")
        .and_then(Value::as_str)
        .ok_or(CodecError::InvalidFault("faultString"))?
        .to_owned();
    Ok(MethodResponse::Fault { code, message })
}

/// Owned view of the parser events the grammar cares about.
#[derive(Debug)]
enum Token {
    Start(String),
    Empty(String),
    End(String),
    Text(String),
    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Start(tag) => write!(f, "<{tag}>"),
            Token::Empty(tag) => write!(f, "<{tag}/>"),
            Token::End(tag) => write!(f, "</{tag}>"),
            Token::Text(text) => write!(f, "text '{}'", text.trim()),
            Token::Eof => write!(f, "end of document"),
        }
    }
}

fn unexpected(expected: &str, found: &Token) -> CodecError {
    CodecError::Unexpected {
        expected: expected.to_owned(),
        found: found.to_string(),
    }
}

fn invalid(kind: &str, content: &str) -> CodecError {
    CodecError::InvalidScalar {
        kind: kind.to_owned(),
        content: content.to_owned(),
    }
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        loop {
            let token = match self.reader.read_event()? {
                Event::Start(e) => Token::Start(std::str::from_utf8(e.name().as_ref())?.to_owned()),
                Event::Empty(e) => Token::Empty(std::str::from_utf8(e.name().as_ref())?.to_owned()),
                Event::End(e) => Token::End(std::str::from_utf8(e.name().as_ref())?.to_owned()),
                Event::Text(e) => Token::Text(e.unescape()?.into_owned()),
                Event::CData(e) => Token::Text(std::str::from_utf8(&e)?.to_owned()),
                Event::Eof => Token::Eof,
                // Declarations, comments, processing instructions, doctypes.
                _ => continue,
            };
            return Ok(token);
        }
    }

    /// Next token, skipping whitespace-only text between elements.
    fn next_significant(&mut self) -> Result<Token> {
        loop {
            match self.next_token()? {
                Token::Text(text) if text.trim().is_empty() => continue,
                token => return Ok(token),
            }
        }
    }

    fn expect_start(&mut self, name: &str) -> Result<()> {
        match self.next_significant()? {
            Token::Start(tag) if tag == name => Ok(()),
            other => Err(unexpected(&format!("<{name}>"), &other)),
        }
    }

    fn expect_end(&mut self, name: &str) -> Result<()> {
        match self.next_significant()? {
            Token::End(tag) if tag == name => Ok(()),
            other => Err(unexpected(&format!("</{name}>"), &other)),
        }
    }

    /// Concatenated text up to `</name>`; nested elements are an error.
    fn text_until(&mut self, name: &str) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::End(tag) if tag == name => return Ok(text),
                other => return Err(unexpected(&format!("text or </{name}>"), &other)),
            }
        }
    }

    /// Reads a complete `<value>...</value>` (or `<value/>`).
    fn value(&mut self) -> Result<Value> {
        match self.next_significant()? {
            Token::Start(tag) if tag == "value" => self.value_body(),
            Token::Empty(tag) if tag == "value" => Ok(Value::String(String::new())),
            other => Err(unexpected("<value>", &other)),
        }
    }

    /// Reads the content of a `<value>` whose start tag was consumed.
    ///
    /// Untyped content is a string and keeps its whitespace.
    fn value_body(&mut self) -> Result<Value> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::End(tag) if tag == "value" => return Ok(Value::String(text)),
                Token::Start(tag) => {
                    let value = self.typed(&tag)?;
                    self.expect_end("value")?;
                    return Ok(value);
                }
                Token::Empty(tag) => {
                    let value = empty_typed(&tag)?;
                    self.expect_end("value")?;
                    return Ok(value);
                }
                other => return Err(unexpected("value content", &other)),
            }
        }
    }

    /// Reads a typed value whose start tag `<tag>` was consumed.
    fn typed(&mut self, tag: &str) -> Result<Value> {
        match tag {
            "int" | "i4" => {
                let text = self.text_until(tag)?;
                text.trim()
                    .parse::<i32>()
                    .map(Value::Int)
                    .map_err(|_| invalid(tag, &text))
            }
            "boolean" => {
                let text = self.text_until(tag)?;
                match text.trim() {
                    "1" => Ok(Value::Boolean(true)),
                    "0" => Ok(Value::Boolean(false)),
                    _ => Err(invalid(tag, &text)),
                }
            }
            "string" => self.text_until(tag).map(Value::String),
            "double" => {
                let text = self.text_until(tag)?;
                text.trim()
                    .parse::<f64>()
                    .map(Value::Double)
                    .map_err(|_| invalid(tag, &text))
            }
            "dateTime.iso8601" => {
                let text = self.text_until(tag)?;
                let trimmed = text.trim();
                NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT)
                    .or_else(|_| NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT_DASHED))
                    .map(Value::DateTime)
                    .map_err(|_| invalid(tag, &text))
            }
            "base64" => {
                let text = self.text_until(tag)?;
                let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                BASE64
                    .decode(compact.as_bytes())
                    .map(Value::Base64)
                    .map_err(|_| invalid(tag, &text))
            }
            "struct" => self.struct_body().map(Value::Struct),
            "array" => self.array_body().map(Value::Array),
            "nil" => {
                self.expect_end("nil")?;
                Ok(Value::Nil)
            }
            other => Err(CodecError::UnknownType(other.to_owned())),
        }
    }

    fn struct_body(&mut self) -> Result<BTreeMap<String, Value>> {
        let mut members = BTreeMap::new();
        loop {
            match self.next_significant()? {
                Token::Start(tag) if tag == "member" => {
                    let name = match self.next_significant()? {
                        Token::Start(tag) if tag == "name" => self.text_until("name")?,
                        Token::Empty(tag) if tag == "name" => String::new(),
                        other => return Err(unexpected("<name>", &other)),
                    };
                    let value = self.value()?;
                    self.expect_end("member")?;
                    members.insert(name, value);
                }
                Token::End(tag) if tag == "struct" => return Ok(members),
                other => return Err(unexpected("<member> or </struct>", &other)),
            }
        }
    }

    fn array_body(&mut self) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        match self.next_significant()? {
            Token::Start(tag) if tag == "data" => loop {
                match self.next_significant()? {
                    Token::Start(tag) if tag == "value" => items.push(self.value_body()?),
                    Token::Empty(tag) if tag == "value" => items.push(Value::String(String::new())),
                    Token::End(tag) if tag == "data" => break,
                    other => return Err(unexpected("<value> or </data>", &other)),
                }
            },
            Token::Empty(tag) if tag == "data" => {}
            other => return Err(unexpected("<data>", &other)),
        }
        self.expect_end("array")?;
        Ok(items)
    }
}

/// Self-closing typed elements such as `<string/>` or `<nil/>`.
fn empty_typed(tag: &str) -> Result<Value> {
    match tag {
        "string" => Ok(Value::String(String::new())),
        "nil" => Ok(Value::Nil),
        "base64" => Ok(Value::Base64(Vec::new())),
        "struct" => Ok(Value::Struct(BTreeMap::new())),
        "array" => Ok(Value::Array(Vec::new())),
        "int" | "i4" | "boolean" | "double" | "dateTime.iso8601" => Err(invalid(tag, "")),
        other => Err(CodecError::UnknownType(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn test_encode_call_preserves_parameter_order() {
        let xml = encode_call(
            "createDocument",
            &[
                Value::from("File"),
                Value::Struct(BTreeMap::from([("Title".to_owned(), Value::from("Doc"))])),
                Value::from("workspaces"),
                Value::Int(0),
            ],
        );
        assert_eq!(
            xml,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                "<methodCall><methodName>createDocument</methodName><params>",
                "<param><value><string>File</string></value></param>",
                "<param><value><struct><member><name>Title</name>",
                "<value><string>Doc</string></value></member></struct></value></param>",
                "<param><value><string>workspaces</string></value></param>",
                "<param><value><int>0</int></value></param>",
                "</params></methodCall>"
            )
        );
    }

    #[test]
    fn test_encode_escapes_markup() {
        let xml = encode_call("listContent", &[Value::from("a<b & c")]);
        assert!(xml.contains("<string>a&lt;b &amp; c</string>"));
    }

    #[test]
    fn test_encode_base64_and_nil() {
        let xml = encode_response(&Value::Array(vec![Value::Base64(b"Bla bla ...".to_vec()), Value::Nil]));
        assert!(xml.contains("<base64>QmxhIGJsYSAuLi4=</base64>"));
        assert!(xml.contains("<value><nil/></value>"));
    }

    #[test]
    fn test_decode_python_style_list_response() {
        let xml = "<?xml version='1.0'?>\n<methodResponse>\n<params>\n<param>\n\
                   <value><array><data>\n<value><string>workspaces/doc1</string></value>\n\
                   <value>workspaces/doc2</value>\n</data></array></value>\n\
                   </param>\n</params>\n</methodResponse>\n";
        let response = decode_response(xml).unwrap();
        assert_eq!(
            response,
            MethodResponse::Success(Value::Array(strings(&["workspaces/doc1", "workspaces/doc2"])))
        );
    }

    #[test]
    fn test_decode_fault() {
        let xml = "<?xml version='1.0'?>\n<methodResponse>\n<fault>\n<value><struct>\n\
                   <member>\n<name>faultCode</name>\n<value><int>-1</int></value>\n</member>\n\
                   <member>\n<name>faultString</name>\n\
                   <value><string>KeyError: 'no-such-doc'</string></value>\n</member>\n\
                   </struct></value>\n</fault>\n</methodResponse>\n";
        let response = decode_response(xml).unwrap();
        assert_eq!(
            response,
            MethodResponse::Fault {
                code: -1,
                message: "KeyError: 'no-such-doc'".into()
            }
        );
        assert!(response.into_result().unwrap_err().is_fault());
    }

    #[test]
    fn test_decode_fault_without_code_is_malformed() {
        let xml = "<methodResponse><fault><value><struct><member><name>faultString</name>\
                   <value>oops</value></member></struct></value></fault></methodResponse>";
        assert!(matches!(
            decode_response(xml),
            Err(CodecError::InvalidFault("faultCode"))
        ));
    }

    #[test]
    fn test_decode_scalars() {
        let xml = "<methodResponse><params><param><value><struct>\
                   <member><name>count</name><value><i4> 42 </i4></value></member>\
                   <member><name>locked</name><value><boolean>1</boolean></value></member>\
                   <member><name>ratio</name><value><double>0.5</double></value></member>\
                   <member><name>modified</name><value>\
                   <dateTime.iso8601>20060102T10:30:00</dateTime.iso8601></value></member>\
                   <member><name>file</name><value><base64>QmxhIGJs\nYSAuLi4=</base64></value></member>\
                   <member><name>owner</name><value><nil/></value></member>\
                   <member><name>note</name><value><string/></value></member>\
                   </struct></value></param></params></methodResponse>";
        let MethodResponse::Success(Value::Struct(members)) = decode_response(xml).unwrap() else {
            panic!("expected a struct");
        };
        assert_eq!(members["count"], Value::Int(42));
        assert_eq!(members["locked"], Value::Boolean(true));
        assert_eq!(members["ratio"], Value::Double(0.5));
        assert_eq!(
            members["modified"],
            Value::DateTime(
                NaiveDate::from_ymd_opt(2006, 1, 2)
                    .unwrap()
                    .and_hms_opt(10, 30, 0)
                    .unwrap()
            )
        );
        assert_eq!(members["file"], Value::Base64(b"Bla bla ...".to_vec()));
        assert_eq!(members["owner"], Value::Nil);
        assert_eq!(members["note"], Value::String(String::new()));
    }

    #[test]
    fn test_decode_string_keeps_whitespace_and_entities() {
        let xml = "<methodResponse><params><param><value><string>  a &amp; b  </string></value>\
                   </param></params></methodResponse>";
        assert_eq!(
            decode_response(xml).unwrap(),
            MethodResponse::Success(Value::from("  a & b  "))
        );
    }

    #[test]
    fn test_decode_empty_array() {
        let xml = "<methodResponse><params><param><value><array><data/></array></value>\
                   </param></params></methodResponse>";
        assert_eq!(
            decode_response(xml).unwrap(),
            MethodResponse::Success(Value::Array(vec![]))
        );
    }

    #[test]
    fn test_decode_rejects_bad_int() {
        let xml = "<methodResponse><params><param><value><int>forty</int></value>\
                   </param></params></methodResponse>";
        assert!(matches!(
            decode_response(xml),
            Err(CodecError::InvalidScalar { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let xml = "<methodResponse><params><param><value><i8>1</i8></value>\
                   </param></params></methodResponse>";
        assert!(matches!(decode_response(xml), Err(CodecError::UnknownType(t)) if t == "i8"));
    }

    #[test]
    fn test_decode_rejects_non_xmlrpc_document() {
        let err = decode_response("<html><body>Unauthorized</body></html>").unwrap_err();
        let remote: RemoteError = err.into();
        assert!(matches!(remote, RemoteError::MalformedResponse(_)));
        assert!(decode_response("").is_err());
    }

    #[test]
    fn test_decode_call_reads_method_and_params() {
        let xml = encode_call("getLocalRoles", &strings(&["alice", "workspaces"]));
        let call = decode_call(&xml).unwrap();
        assert_eq!(call.method, "getLocalRoles");
        assert_eq!(call.params, strings(&["alice", "workspaces"]));
    }

    #[test]
    fn test_decode_call_without_params() {
        let call = decode_call("<methodCall><methodName>ping</methodName></methodCall>").unwrap();
        assert_eq!(call.method, "ping");
        assert!(call.params.is_empty());
    }
}
