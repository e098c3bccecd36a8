#![allow(missing_docs)]
#![allow(dead_code)]

use jsoncore::{Name, ParserError, Token, TokenStream};

/// Compact document touching every scalar kind the text format has.
pub const SAMPLE: &str = r#"{"id":42,"name":"Smile \"binary\" JSON","tags":["fast","compact","fast"],"ratio":0.75,"offset":-17,"big":123456789012345678901234567890,"nested":{"empty":{},"list":[],"flags":[true,false,null],"text":"line\nbreak","unicode":"naïve ☃ 😃"},"records":[{"id":1,"kind":"a"},{"id":2,"kind":"b"},{"id":3,"kind":"a"}]}"#;

/// One line per token: `depth token [name] [value]`.
pub fn render(stream: &mut impl TokenStream) -> Result<String, ParserError> {
    let mut out = String::new();
    while let Some(token) = stream.next_token()? {
        let value = match token {
            Token::FieldName => format!(
                " {:?}",
                stream.current_name().map(Name::as_str).unwrap_or_default()
            ),
            Token::String => format!(" {:?}", stream.text().unwrap_or_default()),
            Token::Integer | Token::Float => format!(" {}", stream.number_value()?),
            Token::EmbeddedBinary => format!(" {:02X?}", &*stream.binary_value()?),
            _ => String::new(),
        };
        out.push_str(&format!("{} {token:?}{value}\n", stream.depth()));
    }
    Ok(out)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
