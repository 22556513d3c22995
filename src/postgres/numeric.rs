//! Binary wire format of Postgres `NUMERIC`, converted to and from decimal text.
//!
//! The value is a header of four 16-bit fields (digit count, weight, sign, display scale)
//! followed by base-10000 digits, most significant first. `weight` is the power of 10000 of the
//! first digit.

use std::error::Error;
use std::fmt::Write as _;

use tokio_postgres::types::{FromSql, Type};
use tokio_util::bytes::BytesMut;

type BoxError = Box<dyn Error + Sync + Send>;

const SIGN_POS: u16 = 0x0000;
const SIGN_NEG: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;
const SIGN_PINF: u16 = 0xD000;
const SIGN_NINF: u16 = 0xF000;

/// A `NUMERIC` column read as exact decimal text.
pub(crate) struct NumericText(pub(crate) String);

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode(raw).map(NumericText)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

fn read_u16(raw: &[u8], at: usize) -> Result<u16, BoxError> {
    raw.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| "truncated numeric value".into())
}

fn read_i16(raw: &[u8], at: usize) -> Result<i16, BoxError> {
    read_u16(raw, at).map(|v| i16::from_be_bytes(v.to_be_bytes()))
}

/// Decode a binary `NUMERIC` into text such as `-12.50`, `NaN` or `Infinity`.
pub(crate) fn decode(raw: &[u8]) -> Result<String, BoxError> {
    let ndigits = usize::from(read_u16(raw, 0)?);
    let weight = i32::from(read_i16(raw, 2)?);
    let sign = read_u16(raw, 4)?;
    let dscale = usize::from(read_u16(raw, 6)?);
    match sign {
        SIGN_NAN => return Ok("NaN".to_owned()),
        SIGN_PINF => return Ok("Infinity".to_owned()),
        SIGN_NINF => return Ok("-Infinity".to_owned()),
        SIGN_POS | SIGN_NEG => {}
        other => return Err(format!("unknown numeric sign {other:#06x}").into()),
    }
    let digits = (0..ndigits)
        .map(|i| read_i16(raw, 8 + 2 * i))
        .collect::<Result<Vec<_>, _>>()?;
    // digits outside the stored range are implicit zeros
    let digit_at = |pos: i32| {
        usize::try_from(pos)
            .ok()
            .and_then(|p| digits.get(p))
            .copied()
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == SIGN_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        write!(out, "{}", digit_at(0))?;
        for pos in 1..=weight {
            write!(out, "{:04}", digit_at(pos))?;
        }
    }
    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut pos = weight + 1;
        while fraction.len() < dscale {
            write!(fraction, "{:04}", digit_at(pos))?;
            pos += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }
    Ok(out)
}

/// Encode decimal text (`[+-]digits[.digits]`, `NaN`, `Infinity`) as a binary `NUMERIC`.
pub(crate) fn encode(text: &str, out: &mut BytesMut) -> Result<(), BoxError> {
    let text = text.trim();
    let special = match text.to_ascii_lowercase().as_str() {
        "nan" => Some(SIGN_NAN),
        "infinity" | "+infinity" | "inf" => Some(SIGN_PINF),
        "-infinity" | "-inf" => Some(SIGN_NINF),
        _ => None,
    };
    if let Some(sign) = special {
        write_header(out, 0, 0, sign, 0);
        return Ok(());
    }

    let (sign, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (SIGN_NEG, &text[1..]),
        Some(b'+') => (SIGN_POS, &text[1..]),
        _ => (SIGN_POS, text),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let well_formed = !(whole.is_empty() && fraction.is_empty())
        && whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(format!("`{text}` is not a decimal number").into());
    }
    let dscale = u16::try_from(fraction.len())?;

    let whole = whole.trim_start_matches('0');
    let lead = (4 - whole.len() % 4) % 4;
    let mut padded = "0".repeat(lead);
    padded.push_str(whole);
    let whole_groups = padded.len() / 4;
    padded.push_str(fraction);
    padded.push_str(&"0".repeat((4 - fraction.len() % 4) % 4));

    let mut groups = padded
        .as_bytes()
        .chunks(4)
        .map(|chunk| -> Result<i16, BoxError> { Ok(std::str::from_utf8(chunk)?.parse()?) })
        .collect::<Result<Vec<_>, _>>()?;
    let mut weight = i16::try_from(whole_groups)? - 1;
    let leading_zeros = groups.iter().take_while(|g| **g == 0).count();
    groups.drain(..leading_zeros);
    weight -= i16::try_from(leading_zeros)?;
    while groups.last() == Some(&0) {
        groups.pop();
    }
    if groups.is_empty() {
        weight = 0;
    }

    write_header(out, u16::try_from(groups.len())?, weight, sign, dscale);
    for group in groups {
        out.extend_from_slice(&group.to_be_bytes());
    }
    Ok(())
}

fn write_header(out: &mut BytesMut, ndigits: u16, weight: i16, sign: u16, dscale: u16) {
    out.extend_from_slice(&ndigits.to_be_bytes());
    out.extend_from_slice(&weight.to_be_bytes());
    out.extend_from_slice(&sign.to_be_bytes());
    out.extend_from_slice(&dscale.to_be_bytes());
}

/// Text form of an `f64` accepted by [`encode`]; `Display` never uses an exponent.
pub(crate) fn float_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        let label = if value > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_owned()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(text: &str) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode(text, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn encodes_groups_weight_and_scale() {
        // 12345.678 -> digits [1, 2345, 6780], weight 1, scale 3
        assert_eq!(
            wire("12345.678"),
            vec![0, 3, 0, 1, 0, 0, 0, 3, 0, 1, 0x09, 0x29, 0x1A, 0x7C]
        );
        // -0.0005 -> digits [5], weight -1, scale 4
        assert_eq!(wire("-0.0005"), vec![0, 1, 0xFF, 0xFF, 0x40, 0, 0, 4, 0, 5]);
        assert_eq!(wire("0"), vec![0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn decodes_what_it_encodes() {
        for text in ["12345.678", "-0.0005", "0", "6", "10000", "0.00000001", "-42.50", "NaN"] {
            assert_eq!(decode(&wire(text)).unwrap(), text);
        }
        assert_eq!(decode(&wire("+007.10")).unwrap(), "7.10");
    }

    #[test]
    fn rejects_malformed_text_and_short_input() {
        let mut buf = BytesMut::new();
        assert!(encode("1e5", &mut buf).is_err());
        assert!(encode("12.3.4", &mut buf).is_err());
        assert!(encode("-", &mut buf).is_err());
        assert!(decode(&[0, 1, 0]).is_err());
    }

    #[test]
    fn floats_render_without_exponent() {
        assert_eq!(float_text(2.5), "2.5");
        assert_eq!(float_text(1e20), "100000000000000000000");
        assert_eq!(float_text(f64::NEG_INFINITY), "-Infinity");
    }
}
