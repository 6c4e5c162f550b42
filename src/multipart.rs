// multipart/form-data encoder. Writes parts straight into any `io::Write`
// so the whole body can be buffered (and measured) before it is sent.

use std::io::{self, Write};

/// Streams a `multipart/form-data` body into `inner`.
///
/// Parts are written in call order. A file part is written through the
/// `PartWriter` returned by `create_form_file`, which must be dropped
/// before the next part is started. `close` writes the trailing boundary.
pub struct MultipartWriter<W: Write> {
    inner: W,
    boundary: String,
    has_parts: bool,
    closed: bool,
}

impl<W: Write> MultipartWriter<W> {
    /// Create a writer with a random boundary.
    pub fn new(inner: W) -> Self {
        let boundary = uuid::Uuid::new_v4().simple().to_string();
        Self::with_boundary(inner, boundary)
    }

    pub fn with_boundary(inner: W, boundary: impl Into<String>) -> Self {
        MultipartWriter {
            inner,
            boundary: boundary.into(),
            has_parts: false,
            closed: false,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Write a plain text form field.
    pub fn write_field(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.start_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n",
            escape_quotes(name)
        ))?;
        self.inner.write_all(value.as_bytes())
    }

    /// Start a file part and return a writer for its content.
    pub fn create_form_file(&mut self, field: &str, file_name: &str) -> io::Result<PartWriter<'_, W>> {
        self.start_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n",
            escape_quotes(field),
            escape_quotes(file_name)
        ))?;
        Ok(PartWriter {
            inner: &mut self.inner,
        })
    }

    /// Finish the body with the closing boundary. Calling it twice is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.has_parts {
            self.inner.write_all(b"\r\n")?;
        }
        write!(self.inner, "--{}--\r\n", self.boundary)?;
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn start_part(&mut self, headers: &str) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "multipart writer already closed",
            ));
        }
        if self.has_parts {
            self.inner.write_all(b"\r\n")?;
        }
        self.has_parts = true;
        write!(self.inner, "--{}\r\n{}\r\n", self.boundary, headers)
    }
}

/// Content writer for one file part.
pub struct PartWriter<'a, W: Write> {
    inner: &'a mut W,
}

impl<W: Write> Write for PartWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
