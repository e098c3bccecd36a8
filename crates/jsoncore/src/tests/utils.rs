use std::io::{self, Read};

use crate::{
    error::ParserError,
    stream::TokenStream,
    symbols::Name,
    token::Token,
};

/// Renders every remaining token on one line: containers as brackets, names
/// with a trailing colon, strings quoted, numbers in their display form.
pub(crate) fn dump(stream: &mut impl TokenStream) -> Result<String, ParserError> {
    let mut out = Vec::new();
    while let Some(token) = stream.next_token()? {
        out.push(match token {
            Token::FieldName => format!(
                "{:?}:",
                stream.current_name().map(Name::as_str).unwrap_or_default()
            ),
            Token::String => format!("{:?}", stream.text().unwrap_or_default()),
            Token::Integer | Token::Float => stream.number_value()?.to_string(),
            Token::EmbeddedBinary => format!("bin{:?}", &*stream.binary_value()?),
            other => other.as_static_str().unwrap_or_default().to_owned(),
        });
    }
    Ok(out.join(" "))
}

/// Reader that hands out its data in the given chunk sizes, then one byte at
/// a time.
pub(crate) struct Chunked<'a> {
    data: &'a [u8],
    sizes: Vec<usize>,
    next: usize,
}

impl<'a> Chunked<'a> {
    pub(crate) fn new(data: &'a [u8], sizes: Vec<usize>) -> Self {
        Self {
            data,
            sizes,
            next: 0,
        }
    }

    pub(crate) fn one_byte(data: &'a [u8]) -> Self {
        Self::new(data, Vec::new())
    }
}

impl Read for Chunked<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let size = self.sizes.get(self.next).map_or(1, |s| 1 + s % 17);
        self.next += 1;
        let n = size.min(out.len()).min(self.data.len());
        out[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

pub(crate) fn property_tests() -> u64 {
    if cfg!(feature = "test-fast") {
        20
    } else if is_ci::cached() {
        2_000
    } else {
        300
    }
}
