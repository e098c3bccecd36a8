#![no_main]
use std::{cell::RefCell, io::Read};

use arbitrary::Arbitrary;
use jsoncore::{
    CodecFactory, JsonEncoding, ParserOptions, SmileOptions, Token, TokenStream, transcode,
};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::{Rng, RngCore, SeedableRng, rngs::SmallRng};
use serde_json::{Map, Value};

const HEADER: usize = 5; // 1 flag byte + 4-byte split seed

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Mostly valid JSON documents, occasionally libFuzzer's own mutations.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size < HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8);
        data[1..5].copy_from_slice(&with_rng(|rng| rng.next_u32().to_le_bytes()));
        HEADER + append_value(&mut data[HEADER..], size.max(16), max_size - HEADER)
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fn append_value(data: &mut [u8], size: usize, limit: usize) -> usize {
    let value = loop {
        let s = with_rng(|rng| rng.random_range(size / 2..size * 2).min(limit));
        let bytes: Vec<u8> = with_rng(|rng| (0..s).map(|_| rng.random::<u8>()).collect());
        if let Ok(value) = ArbitraryValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break value;
        }
    };
    let serialized = serde_json::to_vec(&value.0).unwrap_or_default();
    let len = serialized.len().min(limit);
    data[..len].copy_from_slice(&serialized[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(21)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => Value::Number(u.arbitrary::<i64>()?.into()),
            3 => Value::Number(
                serde_json::Number::from_f64(u.arbitrary()?)
                    .ok_or(arbitrary::Error::IncorrectFormat)?,
            ),
            4..=10 => Value::String(u.arbitrary()?),
            11..=15 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            _ => {
                let m: Vec<(String, ArbitraryValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
        };
        Ok(ArbitraryValue(value))
    }
}

/// Hands out the input in pseudo-random chunk sizes.
struct Split<'a> {
    data: &'a [u8],
    rng: SmallRng,
}

impl Read for Split<'_> {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let n = self
            .rng
            .random_range(1..=32)
            .min(out.len())
            .min(self.data.len());
        out[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

type Tokens = Option<Vec<(Token, Option<String>)>>;

fn drain(stream: &mut impl TokenStream) -> Tokens {
    let mut tokens = Vec::new();
    loop {
        match stream.next_token() {
            Ok(Some(token)) => tokens.push((token, stream.text().map(|t| t.into_owned()))),
            Ok(None) => return Some(tokens),
            Err(_) => return None,
        }
    }
}

fn kinds(tokens: &Tokens) -> Option<Vec<Token>> {
    tokens
        .as_ref()
        .map(|t| t.iter().map(|(token, _)| *token).collect())
}

fn codecs(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }
    let flags = data[0];
    let split_seed = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
    let data = &data[HEADER..];

    let factory = CodecFactory::new()
        .with_parser_options(ParserOptions {
            allow_multiple_values: flags & 1 != 0,
            allow_trailing_comma: flags & 2 != 0,
            ..ParserOptions::default()
        })
        .with_smile_options(SmileOptions {
            shared_names: flags & 4 != 0,
            shared_values: flags & 8 != 0,
            raw_binary: flags & 16 != 0,
            require_header: flags & 32 != 0,
            ..SmileOptions::default()
        });
    let split = || Split {
        data,
        rng: SmallRng::seed_from_u64(u64::from(split_seed)),
    };

    // Arbitrary bytes through both decoders; chunking must not matter.
    let whole = drain(&mut factory.create_parser_from_slice(data));
    let chunked = drain(&mut factory.create_parser_with_encoding(split(), JsonEncoding::Utf8));
    assert_eq!(whole, chunked);
    if let Ok(mut parser) = factory.create_parser(split()) {
        drain(&mut parser);
    }
    let smile_whole = drain(&mut factory.create_smile_parser_from_slice(data));
    assert_eq!(smile_whole, drain(&mut factory.create_smile_parser(split())));

    // Valid text must survive a trip through Smile.
    if whole.is_some() {
        let mut smile = Vec::new();
        {
            let mut parser = factory.create_parser_from_slice(data);
            let mut generator = factory.create_smile_generator(&mut smile);
            transcode(&mut parser, &mut generator).expect("valid JSON must transcode");
        }
        let back = drain(&mut factory.create_smile_parser_from_slice(&smile));
        assert_eq!(kinds(&whole), kinds(&back));
    }
}

fuzz_target!(|data: &[u8]| codecs(data));
