//! Push writer for JSON text.

use std::io::Write;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use super::options::GeneratorOptions;
use crate::{
    context::{ContextKind, ContextStack, WriteStatus},
    error::{GeneratorError, StructureError},
    numbers,
    recycler::{ByteBufferKind, CharBufferKind, IoContext, Recycled},
    stream::TokenSink,
};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Writes JSON text to a byte sink.
///
/// Output is staged in a pooled buffer and handed to the writer whenever the
/// buffer fills up, on [`flush`](TokenSink::flush) and on
/// [`close`](Self::close).
pub struct JsonGenerator<W: Write> {
    writer: W,
    buf: Recycled<Vec<u8>>,
    contexts: ContextStack,
    options: GeneratorOptions,
    closed: bool,
    io: IoContext,
}

impl<W: Write> JsonGenerator<W> {
    pub fn new(writer: W) -> Self {
        Self::with_parts(writer, IoContext::default(), GeneratorOptions::default())
    }

    pub(crate) fn with_parts(writer: W, io: IoContext, options: GeneratorOptions) -> Self {
        Self {
            writer,
            buf: io.write_encoding_buffer(),
            contexts: ContextStack::new(),
            options,
            closed: false,
            io,
        }
    }

    #[must_use]
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.contexts.depth()
    }

    /// Writes a number literal verbatim after checking it is valid JSON.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::InvalidNumberText`] for anything that is not a JSON
    /// number, plus the usual structural and I/O errors.
    pub fn write_number_text(&mut self, text: &str) -> Result<(), GeneratorError> {
        if !numbers::is_json_number(text) {
            return Err(GeneratorError::InvalidNumberText(text.to_owned()));
        }
        self.begin_value()?;
        self.buf.extend_from_slice(text.as_bytes());
        self.maybe_flush()
    }

    /// Closes open containers (when `auto_close_content` is set), flushes,
    /// and refuses further writes. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// I/O failure while flushing.
    pub fn close(&mut self) -> Result<(), GeneratorError> {
        if self.closed {
            return Ok(());
        }
        if self.options.auto_close_content {
            while self.contexts.depth() > 0 {
                let frame = self.contexts.current();
                let (dangling, in_object) = (frame.expects_value(), frame.in_object());
                if dangling {
                    self.write_null()?;
                } else if in_object {
                    self.write_end_object()?;
                } else {
                    self.write_end_array()?;
                }
            }
        }
        self.flush_buffer()?;
        self.writer.flush()?;
        self.closed = true;
        Ok(())
    }

    fn check_open(&self) -> Result<(), GeneratorError> {
        if self.closed {
            return Err(StructureError::Closed.into());
        }
        Ok(())
    }

    fn begin_value(&mut self) -> Result<(), GeneratorError> {
        self.check_open()?;
        let status = self.contexts.write_value()?;
        self.write_separator(status);
        Ok(())
    }

    fn write_separator(&mut self, status: WriteStatus) {
        match status {
            WriteStatus::AsIs => {}
            WriteStatus::AfterComma => self.buf.push(b','),
            WriteStatus::AfterRootValue => {
                if let Some(sep) = self.options.root_value_separator {
                    let mut utf8 = [0u8; 4];
                    self.buf
                        .extend_from_slice(sep.encode_utf8(&mut utf8).as_bytes());
                }
            }
        }
    }

    fn close_container(&mut self, kind: ContextKind, marker: u8) -> Result<(), GeneratorError> {
        self.check_open()?;
        self.contexts.check_close(kind)?;
        self.contexts.pop();
        self.buf.push(marker);
        self.maybe_flush()
    }

    fn write_quoted(&mut self, text: &str) {
        self.buf.push(b'"');
        write_escaped(&mut self.buf, text, self.options.escape_non_ascii);
        self.buf.push(b'"');
    }

    fn write_display(&mut self, value: impl core::fmt::Display) -> Result<(), GeneratorError> {
        self.begin_value()?;
        write!(&mut *self.buf, "{value}")?;
        self.maybe_flush()
    }

    /// Checks a float before anything is written for it. Returns the string
    /// to write instead, if non-finite values are written as strings.
    fn non_finite(&self, value: f64) -> Result<Option<&'static str>, GeneratorError> {
        if value.is_finite() {
            return Ok(None);
        }
        if !self.options.write_non_finite_as_strings {
            return Err(GeneratorError::NonFiniteNumber(value));
        }
        Ok(Some(if value.is_nan() {
            "NaN"
        } else if value > 0.0 {
            "Infinity"
        } else {
            "-Infinity"
        }))
    }

    fn maybe_flush(&mut self) -> Result<(), GeneratorError> {
        if self.buf.len() >= ByteBufferKind::WriteEncoding.default_size() {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<(), GeneratorError> {
        if !self.buf.is_empty() {
            self.writer.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }
}

/// Appends `text` with JSON string escaping (without the quotes).
fn write_escaped(buf: &mut Vec<u8>, text: &str, escape_non_ascii: bool) {
    let bytes = text.as_bytes();
    let mut run_start = 0;
    for (i, c) in text.char_indices() {
        let needs_escape = match c {
            '"' | '\\' => true,
            c if u32::from(c) < 0x20 => true,
            c => escape_non_ascii && !c.is_ascii(),
        };
        if !needs_escape {
            continue;
        }
        buf.extend_from_slice(&bytes[run_start..i]);
        run_start = i + c.len_utf8();
        match c {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            '\u{8}' => buf.extend_from_slice(b"\\b"),
            '\u{c}' => buf.extend_from_slice(b"\\f"),
            other => {
                let mut units = [0u16; 2];
                for &unit in other.encode_utf16(&mut units).iter() {
                    buf.extend_from_slice(b"\\u");
                    for shift in [12, 8, 4, 0] {
                        buf.push(HEX[usize::from((unit >> shift) & 0xF)]);
                    }
                }
            }
        }
    }
    buf.extend_from_slice(&bytes[run_start..]);
}

impl<W: Write> TokenSink for JsonGenerator<W> {
    fn write_start_object(&mut self) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.contexts.push(ContextKind::Object);
        self.buf.push(b'{');
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<(), GeneratorError> {
        self.close_container(ContextKind::Object, b'}')
    }

    fn write_start_array(&mut self) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.contexts.push(ContextKind::Array);
        self.buf.push(b'[');
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), GeneratorError> {
        self.close_container(ContextKind::Array, b']')
    }

    fn write_field_name(&mut self, name: &str) -> Result<(), GeneratorError> {
        self.check_open()?;
        let status = self.contexts.write_field_name()?;
        self.write_separator(status);
        self.write_quoted(name);
        self.buf.push(b':');
        self.maybe_flush()
    }

    fn write_string(&mut self, text: &str) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.write_quoted(text);
        self.maybe_flush()
    }

    fn write_i32(&mut self, value: i32) -> Result<(), GeneratorError> {
        self.write_display(value)
    }

    fn write_i64(&mut self, value: i64) -> Result<(), GeneratorError> {
        self.write_display(value)
    }

    fn write_big_integer(&mut self, value: &BigInt) -> Result<(), GeneratorError> {
        self.write_display(value)
    }

    fn write_f32(&mut self, value: f32) -> Result<(), GeneratorError> {
        if let Some(text) = self.non_finite(f64::from(value))? {
            return self.write_string(text);
        }
        self.begin_value()?;
        write!(&mut *self.buf, "{value:?}")?;
        self.maybe_flush()
    }

    fn write_f64(&mut self, value: f64) -> Result<(), GeneratorError> {
        if let Some(text) = self.non_finite(value)? {
            return self.write_string(text);
        }
        self.begin_value()?;
        write!(&mut *self.buf, "{value:?}")?;
        self.maybe_flush()
    }

    fn write_big_decimal(&mut self, value: &BigDecimal) -> Result<(), GeneratorError> {
        self.write_display(value)
    }

    fn write_bool(&mut self, value: bool) -> Result<(), GeneratorError> {
        self.begin_value()?;
        let text: &[u8] = if value { b"true" } else { b"false" };
        self.buf.extend_from_slice(text);
        self.maybe_flush()
    }

    fn write_null(&mut self) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.buf.extend_from_slice(b"null");
        self.maybe_flush()
    }

    fn write_binary(&mut self, data: &[u8]) -> Result<(), GeneratorError> {
        self.begin_value()?;
        let mut encoded = self.io.acquire::<String>(CharBufferKind::ConcatBuffer, 0);
        STANDARD.encode_string(data, &mut *encoded);
        self.buf.push(b'"');
        self.buf.extend_from_slice(encoded.as_bytes());
        self.buf.push(b'"');
        self.maybe_flush()
    }

    fn flush(&mut self) -> Result<(), GeneratorError> {
        self.flush_buffer()?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for JsonGenerator<W> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.flush_buffer();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut JsonGenerator<&mut Vec<u8>>) -> Result<(), GeneratorError>) -> String {
        let mut out = Vec::new();
        {
            let mut g = JsonGenerator::new(&mut out);
            f(&mut g).unwrap();
            g.close().unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn writes_nested_structure() {
        let text = render(|g| {
            g.write_start_object()?;
            g.write_field_name("a")?;
            g.write_start_array()?;
            g.write_i32(1)?;
            g.write_f64(2.5)?;
            g.write_string("x\"y")?;
            g.write_end_array()?;
            g.write_field_name("b")?;
            g.write_null()?;
            g.write_end_object()
        });
        assert_eq!(text, r#"{"a":[1,2.5,"x\"y"],"b":null}"#);
    }

    #[test]
    fn escapes_control_characters() {
        let text = render(|g| g.write_string("\n\t\u{1}\\"));
        assert_eq!(text, r#""\n\t\u0001\\""#);
    }

    #[test]
    fn ascii_only_splits_supplementary_chars() {
        let mut out = Vec::new();
        {
            let options = GeneratorOptions {
                escape_non_ascii: true,
                ..GeneratorOptions::default()
            };
            let mut g = JsonGenerator::with_parts(&mut out, IoContext::default(), options);
            g.write_string("é\u{1F603}").unwrap();
            g.close().unwrap();
        }
        assert_eq!(out, br#""\u00E9\uD83D\uDE03""#);
    }

    #[test]
    fn floats_round_trip() {
        let text = render(|g| {
            g.write_start_array()?;
            g.write_f64(0.1)?;
            g.write_f64(1.0)?;
            g.write_f64(1e-7)?;
            g.write_f32(0.3)?;
            g.write_end_array()
        });
        assert_eq!(text, "[0.1,1.0,1e-7,0.3]");
    }

    #[test]
    fn non_finite_is_refused_without_output() {
        let mut out = Vec::new();
        {
            let mut g = JsonGenerator::new(&mut out);
            g.write_start_array().unwrap();
            let err = g.write_f64(f64::NAN).unwrap_err();
            assert!(matches!(err, GeneratorError::NonFiniteNumber(_)));
            g.write_end_array().unwrap();
            g.close().unwrap();
        }
        assert_eq!(out, b"[]");
    }

    #[test]
    fn structural_errors_write_nothing() {
        let mut out = Vec::new();
        {
            let mut g = JsonGenerator::new(&mut out);
            assert_eq!(
                g.write_field_name("x").unwrap_err().structure_error(),
                Some(StructureError::NameOutsideObject)
            );
            g.write_start_array().unwrap();
            assert_eq!(
                g.write_end_object().unwrap_err().structure_error(),
                Some(StructureError::MismatchedClose {
                    closing: "an object",
                    current: "an array",
                })
            );
            g.flush().unwrap();
        }
        assert_eq!(out, b"[");
    }

    #[test]
    fn root_values_and_auto_close() {
        let text = render(|g| {
            g.write_i32(1)?;
            g.write_bool(true)?;
            g.write_start_object()?;
            g.write_field_name("open")
        });
        assert_eq!(text, r#"1 true {"open":null}"#);
    }

    #[test]
    fn number_text_is_validated() {
        let mut out = Vec::new();
        let mut g = JsonGenerator::new(&mut out);
        assert!(matches!(
            g.write_number_text("01"),
            Err(GeneratorError::InvalidNumberText(_))
        ));
        g.write_number_text("-1.5e10").unwrap();
        g.close().unwrap();
        drop(g);
        assert_eq!(out, b"-1.5e10");
    }

    #[test]
    fn binary_is_base64() {
        let text = render(|g| g.write_binary(&[1, 2, 3, 255, 8, 0, 42]));
        assert_eq!(text, r#""AQID/wgAKg==""#);
    }

    #[test]
    fn writes_after_close_fail() {
        let mut out = Vec::new();
        let mut g = JsonGenerator::new(&mut out);
        g.close().unwrap();
        assert_eq!(
            g.write_null().unwrap_err().structure_error(),
            Some(StructureError::Closed)
        );
    }
}
