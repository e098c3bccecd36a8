//! Push writer for Smile.

use std::io::Write;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use super::{
    SmileHeader, opcode,
    options::SmileOptions,
    shared::{MAX_SHARED_VALUE_BYTES, SeenStrings},
    vint,
};
use crate::{
    context::{ContextKind, ContextStack},
    error::{GeneratorError, StructureError},
    recycler::{ByteBufferKind, IoContext, Recycled},
    stream::TokenSink,
};

/// Writes Smile to a byte sink.
///
/// The header (unless disabled) is staged on construction, so even an empty
/// document produces a well-formed stream once flushed.
pub struct SmileGenerator<W: Write> {
    writer: W,
    buf: Recycled<Vec<u8>>,
    contexts: ContextStack,
    options: SmileOptions,
    seen_names: Option<SeenStrings>,
    seen_values: Option<SeenStrings>,
    closed: bool,
    io: IoContext,
}

impl<W: Write> SmileGenerator<W> {
    pub fn new(writer: W) -> Self {
        Self::with_parts(writer, IoContext::default(), SmileOptions::default())
    }

    pub(crate) fn with_parts(writer: W, io: IoContext, options: SmileOptions) -> Self {
        let mut buf = io.write_encoding_buffer();
        if options.write_header {
            buf.extend_from_slice(&SmileHeader::from_options(&options).to_bytes());
        }
        let overflow = options.shared_overflow;
        Self {
            writer,
            buf,
            contexts: ContextStack::new(),
            seen_names: options
                .shared_names
                .then(|| SeenStrings::new("name", overflow)),
            seen_values: options
                .shared_values
                .then(|| SeenStrings::new("value", overflow)),
            options,
            closed: false,
            io,
        }
    }

    #[must_use]
    pub fn options(&self) -> &SmileOptions {
        &self.options
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    #[must_use]
    pub fn io_context(&self) -> &IoContext {
        &self.io
    }

    /// Number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.contexts.depth()
    }

    /// Closes open containers, writes the end marker if configured, flushes
    /// and refuses further writes. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// I/O failure while flushing.
    pub fn close(&mut self) -> Result<(), GeneratorError> {
        if self.closed {
            return Ok(());
        }
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
        if self.options.write_end_marker {
            self.buf.push(opcode::END_OF_CONTENT);
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
        self.contexts.write_value()?;
        Ok(())
    }

    fn close_container(&mut self, kind: ContextKind, marker: u8) -> Result<(), GeneratorError> {
        self.check_open()?;
        self.contexts.check_close(kind)?;
        self.contexts.pop();
        self.buf.push(marker);
        self.maybe_flush()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_name(&mut self, name: &str) {
        if name.is_empty() {
            self.buf.push(opcode::KEY_EMPTY);
            return;
        }
        if let Some(ix) = self.seen_names.as_ref().and_then(|s| s.find(name)) {
            if ix < 64 {
                self.buf.push(opcode::KEY_SHORT_SHARED | ix as u8);
            } else {
                self.buf
                    .extend_from_slice(&[opcode::KEY_LONG_SHARED | (ix >> 8) as u8, ix as u8]);
            }
            return;
        }
        let bytes = name.as_bytes();
        let len = bytes.len();
        if name.is_ascii() && len <= 64 {
            self.buf.push(opcode::KEY_SHORT_ASCII + (len - 1) as u8);
            self.buf.extend_from_slice(bytes);
        } else if !name.is_ascii() && len <= 57 {
            self.buf.push(opcode::KEY_SHORT_UNICODE + (len - 2) as u8);
            self.buf.extend_from_slice(bytes);
        } else {
            self.buf.push(opcode::KEY_LONG);
            self.buf.extend_from_slice(bytes);
            self.buf.push(opcode::END_STRING);
        }
        if let Some(seen) = &mut self.seen_names {
            seen.add(name);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_text(&mut self, text: &str) {
        if text.is_empty() {
            self.buf.push(opcode::EMPTY_STRING);
            return;
        }
        if let Some(ix) = self.seen_values.as_ref().and_then(|s| s.find(text)) {
            if ix < 31 {
                self.buf.push(ix as u8 + 1);
            } else {
                self.buf.extend_from_slice(&[
                    opcode::LONG_SHARED_VALUE | (ix >> 8) as u8,
                    ix as u8,
                ]);
            }
            return;
        }
        let bytes = text.as_bytes();
        let len = bytes.len();
        let ascii = text.is_ascii();
        let head = match (ascii, len) {
            (true, 1..=32) => Some(opcode::TINY_ASCII + (len - 1) as u8),
            (true, 33..=64) => Some(opcode::SHORT_ASCII + (len - 33) as u8),
            (false, 2..=33) => Some(opcode::TINY_UNICODE + (len - 2) as u8),
            (false, 34..=MAX_SHARED_VALUE_BYTES) => {
                Some(opcode::SHORT_UNICODE + (len - 34) as u8)
            }
            _ => None,
        };
        match head {
            Some(head) => {
                self.buf.push(head);
                self.buf.extend_from_slice(bytes);
                if let Some(seen) = &mut self.seen_values {
                    seen.add(text);
                }
            }
            None => {
                self.buf.push(if ascii {
                    opcode::LONG_ASCII
                } else {
                    opcode::LONG_UNICODE
                });
                self.buf.extend_from_slice(bytes);
                self.buf.push(opcode::END_STRING);
            }
        }
    }

    fn write_signed_magnitude(&mut self, bytes: &[u8]) {
        vint::write_vint(&mut self.buf, bytes.len() as u64);
        vint::encode_7bit(&mut self.buf, bytes);
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

impl<W: Write> TokenSink for SmileGenerator<W> {
    fn write_start_object(&mut self) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.contexts.push(ContextKind::Object);
        self.buf.push(opcode::START_OBJECT);
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<(), GeneratorError> {
        self.close_container(ContextKind::Object, opcode::END_OBJECT)
    }

    fn write_start_array(&mut self) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.contexts.push(ContextKind::Array);
        self.buf.push(opcode::START_ARRAY);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), GeneratorError> {
        self.close_container(ContextKind::Array, opcode::END_ARRAY)
    }

    fn write_field_name(&mut self, name: &str) -> Result<(), GeneratorError> {
        self.check_open()?;
        self.contexts.write_field_name()?;
        self.write_name(name);
        self.maybe_flush()
    }

    fn write_string(&mut self, text: &str) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.write_text(text);
        self.maybe_flush()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_i32(&mut self, value: i32) -> Result<(), GeneratorError> {
        self.begin_value()?;
        let zz = vint::zigzag32(value);
        if zz < 32 {
            self.buf.push(opcode::SMALL_INT + zz as u8);
        } else {
            self.buf.push(opcode::INT32);
            vint::write_vint(&mut self.buf, u64::from(zz));
        }
        self.maybe_flush()
    }

    fn write_i64(&mut self, value: i64) -> Result<(), GeneratorError> {
        if let Ok(small) = i32::try_from(value) {
            return self.write_i32(small);
        }
        self.begin_value()?;
        self.buf.push(opcode::INT64);
        vint::write_vint(&mut self.buf, vint::zigzag64(value));
        self.maybe_flush()
    }

    fn write_big_integer(&mut self, value: &BigInt) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.buf.push(opcode::BIG_INTEGER);
        self.write_signed_magnitude(&value.to_signed_bytes_be());
        self.maybe_flush()
    }

    fn write_f32(&mut self, value: f32) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.buf.push(opcode::FLOAT32);
        vint::write_f32(&mut self.buf, value);
        self.maybe_flush()
    }

    fn write_f64(&mut self, value: f64) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.buf.push(opcode::FLOAT64);
        vint::write_f64(&mut self.buf, value);
        self.maybe_flush()
    }

    fn write_big_decimal(&mut self, value: &BigDecimal) -> Result<(), GeneratorError> {
        let (unscaled, scale) = value.as_bigint_and_exponent();
        let scale = i32::try_from(scale).map_err(|_| GeneratorError::NumberOutOfRange {
            text: value.to_string(),
            target: "a 32-bit decimal scale",
        })?;
        self.begin_value()?;
        self.buf.push(opcode::BIG_DECIMAL);
        vint::write_vint(&mut self.buf, u64::from(vint::zigzag32(scale)));
        self.write_signed_magnitude(&unscaled.to_signed_bytes_be());
        self.maybe_flush()
    }

    fn write_bool(&mut self, value: bool) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.buf
            .push(if value { opcode::TRUE } else { opcode::FALSE });
        self.maybe_flush()
    }

    fn write_null(&mut self) -> Result<(), GeneratorError> {
        self.begin_value()?;
        self.buf.push(opcode::NULL);
        self.maybe_flush()
    }

    fn write_binary(&mut self, data: &[u8]) -> Result<(), GeneratorError> {
        self.begin_value()?;
        if self.options.raw_binary {
            self.buf.push(opcode::RAW_BINARY);
            vint::write_vint(&mut self.buf, data.len() as u64);
            self.buf.extend_from_slice(data);
        } else {
            self.buf.push(opcode::BINARY_7BIT);
            vint::write_vint(&mut self.buf, data.len() as u64);
            vint::encode_7bit(&mut self.buf, data);
        }
        self.maybe_flush()
    }

    fn flush(&mut self) -> Result<(), GeneratorError> {
        self.flush_buffer()?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for SmileGenerator<W> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.flush_buffer();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(
        options: SmileOptions,
        f: impl FnOnce(&mut SmileGenerator<&mut Vec<u8>>) -> Result<(), GeneratorError>,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut generator = SmileGenerator::with_parts(&mut out, IoContext::default(), options);
            f(&mut generator).unwrap();
            generator.close().unwrap();
        }
        out
    }

    #[test]
    fn small_document_bytes() {
        let out = encode(SmileOptions::default(), |g| {
            g.write_start_object()?;
            g.write_field_name("a")?;
            g.write_i32(1)?;
            g.write_field_name("b")?;
            g.write_start_array()?;
            g.write_bool(true)?;
            g.write_null()?;
            g.write_string("x")?;
            g.write_end_array()?;
            g.write_end_object()
        });
        assert_eq!(
            out,
            [
                0x3A, 0x29, 0x0A, 0x01, 0xFA, 0x80, b'a', 0xC2, 0x80, b'b', 0xF8, 0x23, 0x21,
                0x40, b'x', 0xF9, 0xFB,
            ]
        );
    }

    #[test]
    fn repeated_names_become_back_references() {
        let out = encode(SmileOptions::default(), |g| {
            g.write_start_array()?;
            for v in [1, 2] {
                g.write_start_object()?;
                g.write_field_name("a")?;
                g.write_i32(v)?;
                g.write_end_object()?;
            }
            g.write_end_array()
        });
        assert_eq!(
            &out[4..],
            [0xF8, 0xFA, 0x80, b'a', 0xC2, 0xFB, 0xFA, 0x40, 0xC4, 0xFB, 0xF9]
        );
    }

    #[test]
    fn shared_values_only_when_enabled() {
        fn write(g: &mut SmileGenerator<&mut Vec<u8>>) -> Result<(), GeneratorError> {
            g.write_start_array()?;
            g.write_string("abc")?;
            g.write_string("abc")?;
            g.write_end_array()
        }
        let plain = encode(SmileOptions::default(), write);
        assert_eq!(&plain[4..], [0xF8, 0x42, b'a', b'b', b'c', 0x42, b'a', b'b', b'c', 0xF9]);

        let options = SmileOptions {
            shared_values: true,
            ..SmileOptions::default()
        };
        let shared = encode(options, write);
        assert_eq!(shared[3], 0x03);
        assert_eq!(&shared[4..], [0xF8, 0x42, b'a', b'b', b'c', 0x01, 0xF9]);
    }

    #[test]
    fn integers_pick_the_smallest_form() {
        let out = encode(
            SmileOptions {
                write_header: false,
                ..SmileOptions::default()
            },
            |g| {
                g.write_start_array()?;
                g.write_i32(-16)?;
                g.write_i32(15)?;
                g.write_i32(16)?;
                g.write_i64(1 << 40)?;
                g.write_end_array()
            },
        );
        assert_eq!(out[..5], [0xF8, 0xDF, 0xDE, 0x24, 0xA0]);
        assert_eq!(out[5], 0x25);
        assert_eq!(*out.last().unwrap(), 0xF9);
    }

    #[test]
    fn long_strings_are_terminated_and_not_shared() {
        let long = "x".repeat(65);
        let options = SmileOptions {
            shared_values: true,
            write_header: false,
            ..SmileOptions::default()
        };
        let out = encode(options, |g| {
            g.write_start_array()?;
            g.write_string(&long)?;
            g.write_string(&long)?;
            g.write_end_array()
        });
        assert_eq!(out.len(), 1 + 2 * (1 + 65 + 1) + 1);
        assert_eq!(out[1], 0xE0);
        assert_eq!(out[67], 0xFC);
        assert_eq!(out[68], 0xE0);
    }

    #[test]
    fn binary_encodings() {
        let data = [1u8, 2, 3, 255, 8, 0, 42];
        let seven = encode(
            SmileOptions {
                write_header: false,
                ..SmileOptions::default()
            },
            |g| g.write_binary(&data),
        );
        assert_eq!(seven[..2], [0xE8, 0x87]);
        assert_eq!(seven.len(), 2 + 8);
        assert!(seven[2..].iter().all(|b| b & 0x80 == 0));

        let raw = encode(
            SmileOptions {
                raw_binary: true,
                ..SmileOptions::default()
            },
            |g| g.write_binary(&data),
        );
        assert_eq!(raw[3], 0x05);
        assert_eq!(raw[4..6], [0xFD, 0x87]);
        assert_eq!(raw[6..], data);
    }

    #[test]
    fn close_finishes_the_document() {
        let out = encode(
            SmileOptions {
                write_end_marker: true,
                ..SmileOptions::default()
            },
            |g| {
                g.write_start_object()?;
                g.write_field_name("open")
            },
        );
        assert_eq!(&out[4..], [0xFA, 0x83, b'o', b'p', b'e', b'n', 0x21, 0xFB, 0xFF]);
    }

    #[test]
    fn structural_errors_write_nothing() {
        let out = encode(SmileOptions::default(), |g| {
            assert_eq!(
                g.write_field_name("a").unwrap_err().structure_error(),
                Some(StructureError::NameOutsideObject)
            );
            g.write_start_array()?;
            assert!(g.write_end_object().is_err());
            g.write_end_array()
        });
        assert_eq!(&out[4..], [0xF8, 0xF9]);
    }

    #[test]
    fn oversized_decimal_scale_is_out_of_range() {
        let huge = BigDecimal::new(BigInt::from(7), i64::from(i32::MAX) + 1);
        let out = encode(SmileOptions::default(), |g| {
            g.write_start_array()?;
            let err = g.write_big_decimal(&huge).unwrap_err();
            assert!(matches!(
                err,
                GeneratorError::NumberOutOfRange { target: "a 32-bit decimal scale", .. }
            ));
            g.write_end_array()
        });
        assert_eq!(&out[4..], [0xF8, 0xF9]);
    }
}
