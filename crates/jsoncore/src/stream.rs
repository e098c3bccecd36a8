//! Format-agnostic token stream interfaces.
//!
//! [`TokenStream`] is the pull side implemented by both parsers,
//! [`TokenSink`] the push side implemented by both generators. Code written
//! against these traits does not care whether it reads or writes text or
//! Smile.

use std::borrow::Cow;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::{
    error::{GeneratorError, Location, ParserError, TranscodeError},
    numbers::out_of_range,
    symbols::Name,
    token::{Number, NumberType, Token},
};

/// Pull-style reader of tokens.
pub trait TokenStream {
    /// Advances to the next token. Returns `Ok(None)` at end of input, and
    /// after any error.
    ///
    /// # Errors
    ///
    /// Malformed input, I/O failure, or a symbol table collision attack.
    fn next_token(&mut self) -> Result<Option<Token>, ParserError>;

    /// Token the stream is positioned on.
    fn current_token(&self) -> Option<Token>;

    /// Field name associated with the current token: the name itself for
    /// [`Token::FieldName`], the enclosing field's name for values and
    /// container starts inside objects.
    fn current_name(&self) -> Option<&Name>;

    /// Textual form of the current token: decoded string content, the
    /// field name, the literal number text, or the fixed spelling of
    /// structural and literal tokens.
    fn text(&self) -> Option<Cow<'_, str>>;

    /// # Errors
    ///
    /// [`ParserError::WrongToken`] unless the current token is numeric.
    fn number_type(&self) -> Result<NumberType, ParserError>;

    /// # Errors
    ///
    /// [`ParserError::WrongToken`] unless the current token is numeric.
    fn number_value(&self) -> Result<Number, ParserError>;

    /// Binary payload of the current token. Text strings are decoded as
    /// base64.
    ///
    /// # Errors
    ///
    /// [`ParserError::WrongToken`] for tokens without binary content,
    /// [`ParserError::InvalidBase64`] for strings that are not base64.
    fn binary_value(&self) -> Result<Cow<'_, [u8]>, ParserError>;

    /// Where the current token started.
    fn token_location(&self) -> Location;

    /// Where reading stopped.
    fn current_location(&self) -> Location;

    /// Number of open containers.
    fn depth(&self) -> usize;

    /// If positioned on a container start, advances to its matching end.
    ///
    /// # Errors
    ///
    /// Any error from [`next_token`](Self::next_token).
    fn skip_children(&mut self) -> Result<(), ParserError> {
        if !self.current_token().is_some_and(Token::is_struct_start) {
            return Ok(());
        }
        let mut open = 1usize;
        while let Some(token) = self.next_token()? {
            if token.is_struct_start() {
                open += 1;
            } else if token.is_struct_end() {
                open -= 1;
                if open == 0 {
                    break;
                }
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Non-numeric token, or a value that does not fit.
    fn i32_value(&self) -> Result<i32, ParserError> {
        let value = self.number_value()?;
        value
            .to_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| out_of_range(&value.to_string(), "i32"))
    }

    /// # Errors
    ///
    /// Non-numeric token, or a value that does not fit.
    fn i64_value(&self) -> Result<i64, ParserError> {
        let value = self.number_value()?;
        value
            .to_i64()
            .ok_or_else(|| out_of_range(&value.to_string(), "i64"))
    }

    /// # Errors
    ///
    /// Non-numeric token.
    fn f64_value(&self) -> Result<f64, ParserError> {
        Ok(self.number_value()?.to_f64())
    }

    /// # Errors
    ///
    /// Non-numeric token, or a fractional value.
    fn big_integer_value(&self) -> Result<BigInt, ParserError> {
        let value = self.number_value()?;
        value
            .to_big_integer()
            .ok_or_else(|| out_of_range(&value.to_string(), "BigInteger"))
    }

    /// # Errors
    ///
    /// Non-numeric token, or a non-finite float.
    fn big_decimal_value(&self) -> Result<BigDecimal, ParserError> {
        let value = self.number_value()?;
        value
            .to_big_decimal()
            .ok_or_else(|| out_of_range(&value.to_string(), "BigDecimal"))
    }

    /// # Errors
    ///
    /// [`ParserError::WrongToken`] unless the current token is a boolean.
    fn bool_value(&self) -> Result<bool, ParserError> {
        match self.current_token() {
            Some(Token::True) => Ok(true),
            Some(Token::False) => Ok(false),
            other => Err(ParserError::WrongToken(other, "a boolean")),
        }
    }
}

/// Push-style writer of tokens. Calls must follow the token grammar; a call
/// out of sequence fails with [`GeneratorError::Structure`] and writes
/// nothing.
#[allow(clippy::missing_errors_doc)]
pub trait TokenSink {
    fn write_start_object(&mut self) -> Result<(), GeneratorError>;
    fn write_end_object(&mut self) -> Result<(), GeneratorError>;
    fn write_start_array(&mut self) -> Result<(), GeneratorError>;
    fn write_end_array(&mut self) -> Result<(), GeneratorError>;
    fn write_field_name(&mut self, name: &str) -> Result<(), GeneratorError>;
    fn write_string(&mut self, text: &str) -> Result<(), GeneratorError>;
    fn write_i32(&mut self, value: i32) -> Result<(), GeneratorError>;
    fn write_i64(&mut self, value: i64) -> Result<(), GeneratorError>;
    fn write_big_integer(&mut self, value: &BigInt) -> Result<(), GeneratorError>;
    fn write_f32(&mut self, value: f32) -> Result<(), GeneratorError>;
    fn write_f64(&mut self, value: f64) -> Result<(), GeneratorError>;
    fn write_big_decimal(&mut self, value: &BigDecimal) -> Result<(), GeneratorError>;
    fn write_bool(&mut self, value: bool) -> Result<(), GeneratorError>;
    fn write_null(&mut self) -> Result<(), GeneratorError>;
    fn write_binary(&mut self, data: &[u8]) -> Result<(), GeneratorError>;
    fn flush(&mut self) -> Result<(), GeneratorError>;

    fn write_number(&mut self, value: &Number) -> Result<(), GeneratorError> {
        match value {
            Number::Int(v) => self.write_i32(*v),
            Number::Long(v) => self.write_i64(*v),
            Number::BigInteger(v) => self.write_big_integer(v),
            Number::Float(v) => self.write_f32(*v),
            Number::Double(v) => self.write_f64(*v),
            Number::BigDecimal(v) => self.write_big_decimal(v),
        }
    }
}

/// Writes the stream's current token to `sink`.
///
/// # Errors
///
/// Failure to read the token's value, or to write it.
pub fn copy_current_event<S, K>(stream: &S, sink: &mut K) -> Result<(), TranscodeError>
where
    S: TokenStream + ?Sized,
    K: TokenSink + ?Sized,
{
    let Some(token) = stream.current_token() else {
        return Ok(());
    };
    match token {
        Token::StartObject => sink.write_start_object()?,
        Token::EndObject => sink.write_end_object()?,
        Token::StartArray => sink.write_start_array()?,
        Token::EndArray => sink.write_end_array()?,
        Token::FieldName => {
            let name = stream
                .current_name()
                .ok_or(ParserError::WrongToken(Some(token), "a named token"))?;
            sink.write_field_name(name)?;
        }
        Token::String => {
            let text = stream
                .text()
                .ok_or(ParserError::WrongToken(Some(token), "a string"))?;
            sink.write_string(&text)?;
        }
        Token::Integer | Token::Float => sink.write_number(&stream.number_value()?)?,
        Token::True => sink.write_bool(true)?,
        Token::False => sink.write_bool(false)?,
        Token::Null => sink.write_null()?,
        Token::EmbeddedBinary => sink.write_binary(&stream.binary_value()?)?,
    }
    Ok(())
}

/// Copies the current token and, for a field name or container start,
/// everything up to the end of that value.
///
/// # Errors
///
/// See [`copy_current_event`]; also any read failure while advancing.
pub fn copy_current_structure<S, K>(stream: &mut S, sink: &mut K) -> Result<(), TranscodeError>
where
    S: TokenStream + ?Sized,
    K: TokenSink + ?Sized,
{
    let Some(mut token) = stream.current_token() else {
        return Ok(());
    };
    if token == Token::FieldName {
        copy_current_event(stream, sink)?;
        match stream.next_token()? {
            Some(next) => token = next,
            None => return Ok(()),
        }
    }
    copy_current_event(stream, sink)?;
    if token.is_struct_start() {
        let mut open = 1usize;
        while open > 0 {
            let Some(next) = stream.next_token()? else {
                break;
            };
            if next.is_struct_start() {
                open += 1;
            } else if next.is_struct_end() {
                open -= 1;
            }
            copy_current_event(stream, sink)?;
        }
    }
    Ok(())
}

/// Pipes every remaining token of `stream` into `sink`, then flushes.
/// Returns the number of tokens copied.
///
/// # Errors
///
/// The first read or write failure.
pub fn transcode<S, K>(stream: &mut S, sink: &mut K) -> Result<usize, TranscodeError>
where
    S: TokenStream + ?Sized,
    K: TokenSink + ?Sized,
{
    let mut count = 0;
    while stream.next_token()?.is_some() {
        copy_current_event(stream, sink)?;
        count += 1;
    }
    sink.flush()?;
    log::trace!("transcoded {count} tokens");
    Ok(count)
}
