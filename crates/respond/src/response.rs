//! The response sink renderers write into.

use std::io;

use http::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, Response, StatusCode};

use crate::error::RenderError;

/// Minimal HTTP response writer: headers, a status line, then body bytes.
///
/// Renderers set headers before calling [`write_status`](Self::write_status)
/// and write the body afterwards. Implement it for your server's response
/// type; an implementation for `http::Response<Vec<u8>>` is provided.
pub trait ResponseWriter {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_status(&mut self, status: StatusCode);

    fn write_body(&mut self, body: &[u8]) -> io::Result<()>;
}

impl ResponseWriter for Response<Vec<u8>> {
    fn headers(&self) -> &HeaderMap {
        Response::headers(self)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        Response::headers_mut(self)
    }

    fn write_status(&mut self, status: StatusCode) {
        *self.status_mut() = status;
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        self.body_mut().extend_from_slice(body);
        Ok(())
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status)
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        (**self).write_body(body)
    }
}

/// [`io::Write`] over a response body, for serializers that stream.
pub(crate) struct BodyWriter<'a, W: ?Sized>(pub(crate) &'a mut W);

impl<W: ResponseWriter + ?Sized> io::Write for BodyWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_body(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn set_content_type<W: ResponseWriter + ?Sized>(
    w: &mut W,
    content_type: &str,
) -> Result<(), RenderError> {
    let value = HeaderValue::from_str(content_type)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    w.headers_mut().insert(CONTENT_TYPE, value);
    Ok(())
}

/// Writes a plain-text 500 carrying `message`.
pub(crate) fn write_error<W: ResponseWriter + ?Sized>(w: &mut W, message: &str) -> io::Result<()> {
    let headers = w.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    w.write_status(StatusCode::INTERNAL_SERVER_ERROR);
    w.write_body(message.as_bytes())?;
    w.write_body(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_response_impl() {
        let mut res = Response::new(Vec::new());
        set_content_type(&mut res, "text/plain").unwrap();
        res.write_status(StatusCode::CREATED);
        res.write_body(b"a").unwrap();
        BodyWriter(&mut res).write_all(b"bc").unwrap();

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(res.body(), b"abc");
    }

    #[test]
    fn test_invalid_content_type() {
        let mut res = Response::new(Vec::new());
        let err = set_content_type(&mut res, "bad\nvalue").unwrap_err();
        assert!(matches!(err, RenderError::Io(_)));
    }

    #[test]
    fn test_write_error() {
        let mut res = Response::new(Vec::new());
        write_error(&mut res, "boom").unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(res.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(res.body(), b"boom\n");
    }
}
