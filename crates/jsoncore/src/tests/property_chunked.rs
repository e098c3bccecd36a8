use quickcheck::QuickCheck;

use super::{
    arbitrary::Doc,
    utils::{Chunked, dump, property_tests},
};
use crate::{
    CodecFactory,
    json::{JsonGenerator, JsonParser},
    smile::SmileOptions,
};

/// Property: how the input is split across reads never changes the token
/// sequence a text parser produces.
#[test]
fn json_splits_are_invisible() {
    fn prop(doc: Doc, sizes: Vec<usize>) -> bool {
        let mut text = Vec::new();
        {
            let mut generator = JsonGenerator::new(&mut text);
            doc.write(&mut generator).unwrap();
        }
        let whole = dump(&mut JsonParser::new(&text[..])).unwrap();
        let split = dump(&mut JsonParser::new(Chunked::new(&text, sizes))).unwrap();
        whole == split
    }

    QuickCheck::new()
        .tests(property_tests())
        .quickcheck(prop as fn(Doc, Vec<usize>) -> bool);
}

/// Property: the same holds for the binary parser, including multi-byte
/// opcodes and back-references that straddle reads.
#[test]
fn smile_splits_are_invisible() {
    fn prop(doc: Doc, sizes: Vec<usize>) -> bool {
        let factory = CodecFactory::new().with_smile_options(SmileOptions {
            shared_values: true,
            ..SmileOptions::default()
        });
        let mut bytes = Vec::new();
        {
            let mut generator = factory.create_smile_generator(&mut bytes);
            doc.write(&mut generator).unwrap();
        }
        let whole = Doc::read(&mut factory.create_smile_parser_from_slice(&bytes)).unwrap();
        let split = Doc::read(&mut factory.create_smile_parser(Chunked::new(&bytes, sizes))).unwrap();
        whole == split && whole == Some(doc)
    }

    QuickCheck::new()
        .tests(property_tests())
        .quickcheck(prop as fn(Doc, Vec<usize>) -> bool);
}
