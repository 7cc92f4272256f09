//! Oracle NUMBER codec.
//!
//! Oracle NUMBER is a variable-length format where:
//! - the first byte is the base-100 exponent, with the sign in the high bit;
//! - the remaining bytes are base-100 mantissa digits, each stored + 1 for
//!   positive numbers and as 101 - digit for negative numbers;
//! - negative numbers shorter than 20 mantissa bytes end with a 102 byte.

use crate::error::{Error, Result};
use crate::types::Value;

/// Maximum decimal digits in an Oracle NUMBER mantissa.
const MAX_DIGITS: usize = 40;

/// Encode a decimal string (optionally signed, with fraction and exponent).
pub fn encode_oracle_number(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut pos = 0;

    let is_negative = bytes.first() == Some(&b'-');
    if is_negative || bytes.first() == Some(&b'+') {
        pos += 1;
    }

    let mut digits: Vec<u8> = Vec::with_capacity(MAX_DIGITS);
    let mut seen_digit = false;
    let mut decimal_point_index: i32 = 0;

    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        seen_digit = true;
        let digit = bytes[pos] - b'0';
        if digit != 0 || !digits.is_empty() {
            digits.push(digit);
            decimal_point_index += 1;
        }
        pos += 1;
    }

    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            seen_digit = true;
            let digit = bytes[pos] - b'0';
            if digit == 0 && digits.is_empty() {
                decimal_point_index -= 1;
            } else {
                digits.push(digit);
            }
            pos += 1;
        }
    }

    if !seen_digit {
        return Err(Error::type_conversion(format!(
            "'{}' is not a valid number",
            text
        )));
    }

    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let exponent: i32 = text[pos + 1..].parse().map_err(|_| {
            Error::type_conversion(format!("'{}' has an invalid exponent", text))
        })?;
        decimal_point_index = decimal_point_index.saturating_add(exponent);
        pos = bytes.len();
    }

    if pos != bytes.len() {
        return Err(Error::type_conversion(format!(
            "'{}' is not a valid number",
            text
        )));
    }

    while digits.last() == Some(&0) {
        digits.pop();
    }

    if digits.is_empty() {
        return Ok(vec![0x80]);
    }

    if digits.len() > MAX_DIGITS || !(-129..=126).contains(&decimal_point_index) {
        return Err(Error::NumberNoRepresentation);
    }

    // Base-100 pairs need an even number of digits before the decimal point.
    if decimal_point_index.rem_euclid(2) == 1 {
        digits.insert(0, 0);
        decimal_point_index += 1;
    }
    if digits.len() % 2 == 1 {
        digits.push(0);
    }

    let exponent_on_wire = (decimal_point_index / 2 + 192) as u8;
    let num_pairs = digits.len() / 2;
    let mut result = Vec::with_capacity(num_pairs + 2);
    result.push(if is_negative {
        !exponent_on_wire
    } else {
        exponent_on_wire
    });

    for pair in digits.chunks(2) {
        let value = pair[0] * 10 + pair[1];
        result.push(if is_negative { 101 - value } else { value + 1 });
    }

    if is_negative && num_pairs < 20 {
        result.push(102);
    }

    Ok(result)
}

/// Encode an `f64`, rejecting NaN and infinities.
pub fn encode_f64(value: f64) -> Result<Vec<u8>> {
    if value.is_nan() {
        return Err(Error::NanValue);
    }
    if value.is_infinite() {
        return Err(Error::NumberNoRepresentation);
    }
    encode_oracle_number(&value.to_string())
}

/// Encode an `i64`.
pub fn encode_i64(value: i64) -> Result<Vec<u8>> {
    encode_oracle_number(&value.to_string())
}

/// Decode NUMBER bytes into their exact decimal text.
pub fn decode_oracle_number(bytes: &[u8]) -> Result<String> {
    let (&head, rest) = bytes
        .split_first()
        .ok_or_else(|| Error::protocol("NUMBER value has no bytes"))?;
    let positive = head & 0x80 != 0;
    if rest.is_empty() {
        // A bare exponent byte is zero, or negative infinity.
        return Ok(if positive { "0" } else { "-1e126" }.to_string());
    }

    let mantissa = match rest.split_last() {
        Some((&102, body)) if !positive => body,
        _ => rest,
    };
    let base100_exponent = i32::from(if positive { head } else { !head }) - 193;

    let mut digits = Vec::with_capacity(mantissa.len() * 2);
    for &byte in mantissa {
        let pair = if positive {
            byte.wrapping_sub(1)
        } else {
            101u8.wrapping_sub(byte)
        };
        if pair > 99 {
            return Err(Error::protocol(format!(
                "invalid NUMBER mantissa byte {byte:#04x}"
            )));
        }
        digits.push(pair / 10);
        digits.push(pair % 10);
    }

    // Decimal point position, counted in digits from the left.
    let leading_zeros = digits.iter().take_while(|&&d| d == 0).count();
    digits.drain(..leading_zeros);
    while digits.last() == Some(&0) {
        digits.pop();
    }
    if digits.is_empty() {
        return Ok("0".to_string());
    }
    let point = (base100_exponent + 1) * 2 - leading_zeros as i32;

    Ok(format_decimal(!positive, &digits, point))
}

fn format_decimal(negative: bool, digits: &[u8], point: i32) -> String {
    let to_char = |d: &u8| char::from(b'0' + d);
    let len = digits.len() as i32;
    let mut out = String::with_capacity(digits.len() + 4);
    if negative {
        out.push('-');
    }
    if point <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take(point.unsigned_abs() as usize));
        out.extend(digits.iter().map(to_char));
    } else if point >= len {
        out.extend(digits.iter().map(to_char));
        out.extend(std::iter::repeat('0').take((point - len) as usize));
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        out.extend(whole.iter().map(to_char));
        out.push('.');
        out.extend(fraction.iter().map(to_char));
    }
    out
}

/// Choose the narrowest exact representation for a decoded number.
///
/// Integers that fit in `i64` become `Integer`; decimals that survive a round
/// trip through `f64` become `Float`; everything else stays as text.
pub fn number_to_value(text: String) -> Value {
    if !text.contains(['.', 'e']) {
        if let Ok(i) = text.parse::<i64>() {
            return Value::Integer(i);
        }
    } else if let Ok(f) = text.parse::<f64>() {
        if f.is_finite() && f.to_string() == text {
            return Value::Float(f);
        }
    }
    Value::Number(text)
}
