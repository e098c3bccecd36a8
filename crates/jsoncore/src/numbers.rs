//! Deferred number materialization from token text.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::{
    error::ParserError,
    token::{Number, NumberType},
};

/// Narrowest integer type that holds the integer literal `text`.
pub(crate) fn integer_type(text: &str) -> NumberType {
    // Up to 9 digits always fit in i32, up to 18 in i64.
    let digits = text.trim_start_matches('-').len();
    if digits <= 9 {
        NumberType::Int
    } else if digits <= 18 {
        if i32::from_str(text).is_ok() {
            NumberType::Int
        } else {
            NumberType::Long
        }
    } else if i64::from_str(text).is_ok() {
        NumberType::Long
    } else {
        NumberType::BigInteger
    }
}

pub(crate) fn integer_value(text: &str) -> Result<Number, ParserError> {
    if let Ok(v) = i32::from_str(text) {
        return Ok(Number::Int(v));
    }
    if let Ok(v) = i64::from_str(text) {
        return Ok(Number::Long(v));
    }
    BigInt::from_str(text)
        .map(Number::BigInteger)
        .map_err(|_| out_of_range(text, "an integer"))
}

pub(crate) fn float_value(text: &str) -> Result<f64, ParserError> {
    f64::from_str(text).map_err(|_| out_of_range(text, "f64"))
}

pub(crate) fn decimal_value(text: &str) -> Result<BigDecimal, ParserError> {
    BigDecimal::from_str(text).map_err(|_| out_of_range(text, "BigDecimal"))
}

pub(crate) fn out_of_range(text: &str, target: &'static str) -> ParserError {
    ParserError::NumberOutOfRange {
        text: text.to_owned(),
        target,
    }
}

/// Whether `text` is a JSON number literal.
pub(crate) fn is_json_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = usize::from(bytes.first() == Some(&b'-'));
    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let int_len = i - int_start;
    if int_len == 0 || (int_len > 1 && bytes[int_start] == b'0') {
        return false;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        let start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == bytes.len()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0", NumberType::Int)]
    #[case("-2147483648", NumberType::Int)]
    #[case("2147483648", NumberType::Long)]
    #[case("-9223372036854775808", NumberType::Long)]
    #[case("9223372036854775808", NumberType::BigInteger)]
    #[case("123456789012345678901234567890", NumberType::BigInteger)]
    fn integer_promotion(#[case] text: &str, #[case] expected: NumberType) {
        assert_eq!(integer_type(text), expected);
        assert_eq!(integer_value(text).unwrap().number_type(), expected);
    }

    #[rstest]
    #[case("0", true)]
    #[case("-0.5e+10", true)]
    #[case("1E3", true)]
    #[case("01", false)]
    #[case("1.", false)]
    #[case(".5", false)]
    #[case("1e", false)]
    #[case("-", false)]
    #[case("NaN", false)]
    #[case("1 ", false)]
    fn literal_grammar(#[case] text: &str, #[case] valid: bool) {
        assert_eq!(is_json_number(text), valid);
    }

    #[test]
    fn decimals_keep_precision() {
        let d = decimal_value("0.1000000000000000000000001").unwrap();
        assert_eq!(d.to_string(), "0.1000000000000000000000001");
    }
}
