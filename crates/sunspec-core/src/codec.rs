//! Pure encode/decode/scale functions (`spec.md` §4.1).
//!
//! Nothing here touches a catalog or a device image — given a
//! [`PointType`] and bytes (or an integer), these functions are a total,
//! side-effect-free mapping in both directions.

use crate::types::PointType;

/// Encode a raw integer as big-endian, two's-complement register bytes.
///
/// `len_registers` is the point's declared length; for fixed-width types
/// it must match [`PointType::fixed_len_registers`] (debug-asserted, not
/// a panic in release — a catalog mismatch is a bug, not a runtime input).
pub fn encode(ty: PointType, raw: i64, len_registers: u16) -> Vec<u8> {
    debug_assert_ne!(ty, PointType::String, "use encode_str for strings");
    if let Some(fixed) = ty.fixed_len_registers() {
        debug_assert_eq!(fixed, len_registers, "point length disagrees with its declared type");
    }

    let byte_len = len_registers as usize * 2;
    let full = raw.to_be_bytes(); // 8 bytes, big-endian
    full[8 - byte_len..].to_vec()
}

/// Decode big-endian register bytes into a raw integer, sign-extending
/// when `ty` is signed.
pub fn decode(ty: PointType, bytes: &[u8]) -> i64 {
    debug_assert_ne!(ty, PointType::String, "use decode_str for strings");
    let mut buf = [0u8; 8];
    let byte_len = bytes.len();
    buf[8 - byte_len..].copy_from_slice(bytes);

    let unsigned = i64::from_be_bytes(buf);
    if !ty.is_signed() {
        return unsigned;
    }

    // Sign-extend from the declared width: if the top bit of the
    // significant byte is set, fill everything above it with ones.
    let sign_bit_byte = bytes[0];
    if sign_bit_byte & 0x80 != 0 {
        let mut extended = [0xFFu8; 8];
        extended[8 - byte_len..].copy_from_slice(bytes);
        i64::from_be_bytes(extended)
    } else {
        unsigned
    }
}

/// Encode a string as UTF-8 bytes, NUL-padded to `len_registers * 2`
/// bytes, truncated if too long.
pub fn encode_str(s: &str, len_registers: u16) -> Vec<u8> {
    let byte_len = len_registers as usize * 2;
    let mut out = vec![0u8; byte_len];
    let src = s.as_bytes();
    let copy_len = src.len().min(byte_len);
    out[..copy_len].copy_from_slice(&src[..copy_len]);
    out
}

/// Decode NUL-padded bytes into a string, stopping at the first NUL and
/// discarding invalid UTF-8 (SunSpec strings are conventionally ASCII).
pub fn decode_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Apply a scale factor: `value = raw * 10^sf_raw`. Identity when
/// `sf_raw` is `None`.
pub fn scale(raw: i64, sf_raw: Option<i16>) -> f64 {
    match sf_raw {
        None => raw as f64,
        Some(sf) => raw as f64 * 10f64.powi(sf as i32),
    }
}

/// Inverse of [`scale`]: given a scaled value and the current exponent,
/// recover the raw integer (rounding to the nearest representable raw
/// value). Used by the client when re-applying a point's scaled value
/// across a scale-factor change (`spec.md` §4.2 step 3).
pub fn unscale(value: f64, sf_raw: Option<i16>) -> i64 {
    match sf_raw {
        None => value.round() as i64,
        Some(sf) => (value / 10f64.powi(sf as i32)).round() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_uint16() {
        for raw in [0i64, 1, 43928, 65535] {
            let bytes = encode(PointType::Uint16, raw, 1);
            assert_eq!(bytes.len(), 2);
            assert_eq!(decode(PointType::Uint16, &bytes), raw);
        }
    }

    #[test]
    fn round_trip_int16_negative() {
        let bytes = encode(PointType::Int16, -2, 1);
        assert_eq!(bytes, vec![0xFF, 0xFE]);
        assert_eq!(decode(PointType::Int16, &bytes), -2);
    }

    #[test]
    fn round_trip_sunssf() {
        let bytes = encode(PointType::Sunssf, -2, 1);
        assert_eq!(decode(PointType::Sunssf, &bytes), -2);

        let bytes = encode(PointType::Sunssf, 3, 1);
        assert_eq!(decode(PointType::Sunssf, &bytes), 3);
    }

    #[test]
    fn round_trip_uint32() {
        let bytes = encode(PointType::Uint32, 0x1234_5678, 2);
        assert_eq!(bytes, vec![0x12, 0x34, 0x56, 0x78]);
        assert_eq!(decode(PointType::Uint32, &bytes), 0x1234_5678);
    }

    #[test]
    fn round_trip_int32_negative() {
        let bytes = encode(PointType::Int32, -1, 2);
        assert_eq!(bytes, vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(decode(PointType::Int32, &bytes), -1);
    }

    #[test]
    fn round_trip_uint64() {
        let raw = 0x0102_0304_0506_0708u64 as i64;
        let bytes = encode(PointType::Uint64, raw, 4);
        assert_eq!(decode(PointType::Uint64, &bytes), raw);
    }

    #[test]
    fn string_round_trip_pads_and_truncates() {
        let bytes = encode_str("DA", 4);
        assert_eq!(bytes.len(), 8);
        assert_eq!(decode_str(&bytes), "DA");

        let bytes = encode_str("TooLongForFour", 2);
        assert_eq!(bytes.len(), 4);
        assert_eq!(decode_str(&bytes), "TooL");
    }

    #[test]
    fn scale_identity_without_factor() {
        assert_eq!(scale(273, None), 273.0);
    }

    #[test]
    fn scale_applies_power_of_ten() {
        assert_eq!(scale(27300, Some(-2)), 273.0);
        assert_eq!(scale(5, Some(1)), 50.0);
    }

    #[test]
    fn unscale_is_inverse_of_scale() {
        for (raw, sf) in [(27300i64, Some(-2i16)), (5, Some(1)), (42, None)] {
            let value = scale(raw, sf);
            assert_eq!(unscale(value, sf), raw);
        }
    }
}
