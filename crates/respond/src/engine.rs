//! Format renderers.
//!
//! Each renderer sets the response head (Content-Type and status) and writes
//! one serialized value as the body. They are the building blocks behind
//! [`Renderer::json`](crate::Renderer::json) and friends, and can also be used
//! on their own.

use http::header::CONTENT_TYPE;
use http::StatusCode;
use serde::Serialize;

use crate::error::RenderError;
use crate::response::{set_content_type, BodyWriter, ResponseWriter};

/// Content-Type and status shared by every renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub content_type: String,
    pub status: StatusCode,
}

impl Head {
    pub fn new(content_type: impl Into<String>, status: StatusCode) -> Self {
        Self {
            content_type: content_type.into(),
            status,
        }
    }

    /// Sets Content-Type and writes the status.
    pub fn write<W: ResponseWriter + ?Sized>(&self, w: &mut W) -> Result<(), RenderError> {
        set_content_type(w, &self.content_type)?;
        w.write_status(self.status);
        Ok(())
    }

    /// Like [`write`](Self::write), but keeps a Content-Type the caller already set.
    pub fn write_keeping_content_type<W: ResponseWriter + ?Sized>(
        &self,
        w: &mut W,
    ) -> Result<(), RenderError> {
        if !w.headers().contains_key(CONTENT_TYPE) {
            set_content_type(w, &self.content_type)?;
        }
        w.write_status(self.status);
        Ok(())
    }
}

/// Raw bytes, typically `application/octet-stream`.
#[derive(Debug, Clone)]
pub struct Data {
    pub head: Head,
}

impl Data {
    pub fn render<W: ResponseWriter + ?Sized>(&self, w: &mut W, body: &[u8]) -> Result<(), RenderError> {
        self.head.write_keeping_content_type(w)?;
        w.write_body(body)?;
        Ok(())
    }
}

/// Plain text.
#[derive(Debug, Clone)]
pub struct Text {
    pub head: Head,
}

impl Text {
    pub fn render<W: ResponseWriter + ?Sized>(&self, w: &mut W, body: &str) -> Result<(), RenderError> {
        self.head.write_keeping_content_type(w)?;
        w.write_body(body.as_bytes())?;
        Ok(())
    }
}

/// Already-rendered HTML.
#[derive(Debug, Clone)]
pub struct Html {
    pub head: Head,
}

impl Html {
    pub fn render<W: ResponseWriter + ?Sized>(&self, w: &mut W, body: &str) -> Result<(), RenderError> {
        self.head.write(w)?;
        w.write_body(body.as_bytes())?;
        Ok(())
    }
}

/// JSON, optionally indented, prefixed or streamed.
#[derive(Debug, Clone)]
pub struct Json {
    pub head: Head,
    /// Two-space indentation plus a trailing newline.
    pub indent: bool,
    /// Written before the document.
    pub prefix: String,
    /// Serialize into the response as the value is walked. A serialization
    /// failure then leaves a truncated body behind the written head.
    pub streaming: bool,
}

impl Json {
    pub fn render<W, T>(&self, w: &mut W, value: &T) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
        T: Serialize + ?Sized,
    {
        if self.streaming {
            return self.render_streaming(w, value);
        }

        let body = json_bytes(value, self.indent)?;
        self.head.write(w)?;
        w.write_body(self.prefix.as_bytes())?;
        w.write_body(&body)?;
        Ok(())
    }

    fn render_streaming<W, T>(&self, w: &mut W, value: &T) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
        T: Serialize + ?Sized,
    {
        self.head.write(w)?;
        w.write_body(self.prefix.as_bytes())?;
        if self.indent {
            serde_json::to_writer_pretty(BodyWriter(&mut *w), value)?;
            w.write_body(b"\n")?;
        } else {
            serde_json::to_writer(BodyWriter(&mut *w), value)?;
        }
        Ok(())
    }
}

/// JSON wrapped in a callback invocation: `callback(<json>);`.
#[derive(Debug, Clone)]
pub struct Jsonp {
    pub head: Head,
    pub indent: bool,
    pub callback: String,
}

impl Jsonp {
    pub fn render<W, T>(&self, w: &mut W, value: &T) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
        T: Serialize + ?Sized,
    {
        let body = if self.indent {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };

        self.head.write(w)?;
        w.write_body(self.callback.as_bytes())?;
        w.write_body(b"(")?;
        w.write_body(&body)?;
        w.write_body(b");")?;
        if self.indent {
            w.write_body(b"\n")?;
        }
        Ok(())
    }
}

/// XML via serde, optionally indented and prefixed.
#[derive(Debug, Clone)]
pub struct Xml {
    pub head: Head,
    pub indent: bool,
    /// Written before the document, e.g. an XML declaration.
    pub prefix: String,
}

impl Xml {
    pub fn render<W, T>(&self, w: &mut W, value: &T) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
        T: Serialize + ?Sized,
    {
        let body = xml_string(value, self.indent)?;
        self.head.write(w)?;
        w.write_body(self.prefix.as_bytes())?;
        w.write_body(body.as_bytes())?;
        Ok(())
    }
}

fn json_bytes<T: Serialize + ?Sized>(value: &T, indent: bool) -> Result<Vec<u8>, RenderError> {
    if indent {
        let mut body = serde_json::to_vec_pretty(value)?;
        body.push(b'\n');
        Ok(body)
    } else {
        Ok(serde_json::to_vec(value)?)
    }
}

/// Root element for values that carry no element name of their own.
const XML_ROOT: &str = "data";

/// Named structs serialize directly. Maps are wrapped in `<data>`, and scalars
/// and sequences in `<data><value>..</value></data>`.
fn xml_string<T: Serialize + ?Sized>(value: &T, indent: bool) -> Result<String, RenderError> {
    if let Ok(xml) = write_xml(value, None, indent) {
        return Ok(xml);
    }

    let wrapped = match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => serde_json::Value::Object(map),
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("value".to_string(), other);
            serde_json::Value::Object(map)
        }
    };
    write_xml(&wrapped, Some(XML_ROOT), indent)
}

fn write_xml<T: Serialize + ?Sized>(
    value: &T,
    root: Option<&str>,
    indent: bool,
) -> Result<String, RenderError> {
    let xml_error = |e: quick_xml::DeError| RenderError::Serialization(e.to_string());

    let mut out = String::new();
    let mut serializer = match root {
        Some(root) => quick_xml::se::Serializer::with_root(&mut out, Some(root)).map_err(xml_error)?,
        None => quick_xml::se::Serializer::new(&mut out),
    };
    if indent {
        serializer.indent(' ', 2);
    }
    value.serialize(serializer).map_err(xml_error)?;
    Ok(out)
}
