/*
[INPUT]:  Raw device encodings (milli-units, decidegrees, split 32-bit words, 16-bit masks)
[OUTPUT]: Human-facing values and their display strings
[POS]:    Codec layer - pure, total conversions shared by stream, commands and resolver
[UPDATE]: When the device adds encodings or result codes
*/

//! Conversions between device register encodings and operator values.
//!
//! Every function here is total: out-of-range or negative inputs are folded
//! into their unsigned 16/32-bit representation instead of being rejected.

use std::fmt;

use rust_decimal::Decimal;

const TORQUE_SCALE: u32 = 3;
const ANGLE_SCALE: u32 = 1;

/// Fold any integer into its unsigned 16-bit two's-complement representation.
pub fn to_u16(raw: i64) -> u16 {
    raw as u16
}

/// Fold any integer into its unsigned 32-bit two's-complement representation.
pub fn to_u32(raw: i64) -> u32 {
    raw as u32
}

/// Read an unsigned 16-bit register as a signed value (free-run speed).
pub fn signed16(raw: u16) -> i16 {
    raw as i16
}

/// Torque in N·m from milli-newton-meters, carrying three decimals.
pub fn torque_from_milli(raw_mnm: i64) -> Decimal {
    Decimal::new(raw_mnm, TORQUE_SCALE)
}

/// Angle in degrees from decidegrees, carrying one decimal.
pub fn angle_from_deci(raw_decideg: i64) -> Decimal {
    Decimal::new(raw_decideg, ANGLE_SCALE)
}

pub fn format_torque(raw_mnm: i64) -> String {
    format!("{:.3}", torque_from_milli(raw_mnm))
}

pub fn format_angle(raw_decideg: i64) -> String {
    format!("{:.1}", angle_from_deci(raw_decideg))
}

/// Join a hi/lo pair of 16-bit words into one unsigned 32-bit value.
pub fn combine_u32(hi: u16, lo: u16) -> u32 {
    (u32::from(hi) << 16) | u32::from(lo)
}

/// Split an unsigned 32-bit value into (hi, lo) 16-bit words.
pub fn split_u32(value: u32) -> (u16, u16) {
    ((value >> 16) as u16, value as u16)
}

/// `0x`-prefixed lowercase hex, zero-padded to four digits.
pub fn format_hex16(raw: i64) -> String {
    format!("0x{:04x}", to_u16(raw))
}

/// Fault code display: `OK` for the no-fault sentinel, hex otherwise.
pub fn format_fault(raw: i64) -> String {
    let fault = to_u16(raw);
    if fault == 0 {
        "OK".to_string()
    } else {
        format_hex16(i64::from(fault))
    }
}

/// Sixteen `0`/`1` characters, bit 15 first.
pub fn format_bits16(raw: i64) -> String {
    format!("{:016b}", to_u16(raw))
}

/// Outcome of the last fastening cycle.
///
/// Codes the firmware adds later are carried through as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TighteningResult {
    Ok,
    Float,
    Strip,
    Ng,
    Other(i64),
}

impl TighteningResult {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TighteningResult::Ok,
            1 => TighteningResult::Float,
            2 => TighteningResult::Strip,
            3 => TighteningResult::Ng,
            other => TighteningResult::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            TighteningResult::Ok => 0,
            TighteningResult::Float => 1,
            TighteningResult::Strip => 2,
            TighteningResult::Ng => 3,
            TighteningResult::Other(code) => code,
        }
    }
}

impl fmt::Display for TighteningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TighteningResult::Ok => f.write_str("OK"),
            TighteningResult::Float => f.write_str("FLOAT"),
            TighteningResult::Strip => f.write_str("STRIP"),
            TighteningResult::Ng => f.write_str("NG"),
            TighteningResult::Other(code) => write!(f, "{code}"),
        }
    }
}

/// Label for a bare mode code, if the device defines one.
pub fn mode_label(mode: i64) -> Option<&'static str> {
    match mode {
        0 => Some("I/O"),
        1 => Some("RS485/232"),
        3 => Some("CAN"),
        4 => Some("ECAT"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1500, "1.500")]
    #[case(1200, "1.200")]
    #[case(2500, "2.500")]
    #[case(0, "0.000")]
    #[case(7, "0.007")]
    #[case(-250, "-0.250")]
    fn test_format_torque(#[case] raw: i64, #[case] expected: &str) {
        assert_eq!(format_torque(raw), expected);
    }

    #[rstest]
    #[case(450, "45.0")]
    #[case(3600, "360.0")]
    #[case(5, "0.5")]
    #[case(0, "0.0")]
    fn test_format_angle(#[case] raw: i64, #[case] expected: &str) {
        assert_eq!(format_angle(raw), expected);
    }

    #[test]
    fn test_combine_time_words() {
        assert_eq!(combine_u32(0x0001, 0x0002), 65_538);
        assert_eq!(combine_u32(0, 1500), 1500);
        assert_eq!(combine_u32(0xFFFF, 0xFFFF), u32::MAX);
        assert_eq!(split_u32(65_538), (0x0001, 0x0002));
    }

    #[rstest]
    #[case(0, "OK")]
    #[case(10, "0x000a")]
    #[case(0xBEEF, "0xbeef")]
    #[case(-1, "0xffff")]
    #[case(0x1_0000, "OK")]
    fn test_format_fault(#[case] raw: i64, #[case] expected: &str) {
        assert_eq!(format_fault(raw), expected);
    }

    #[test]
    fn test_hex_treats_input_as_unsigned() {
        assert_eq!(format_hex16(8), "0x0008");
        assert_eq!(format_hex16(-2), "0xfffe");
        assert_eq!(format_hex16(0x12_3456), "0x3456");
    }

    #[test]
    fn test_bits_always_sixteen_chars() {
        for raw in [0_i64, 5, 0x8000, 0xFFFF, -1, -32768, 0x1_0005] {
            let text = format_bits16(raw);
            assert_eq!(text.len(), 16, "raw={raw}");
            assert!(text.chars().all(|c| c == '0' || c == '1'));
        }
        assert_eq!(format_bits16(5), "0000000000000101");
        assert_eq!(format_bits16(-1), "1111111111111111");
    }

    #[test]
    fn test_signed16() {
        assert_eq!(signed16(0xFFFF), -1);
        assert_eq!(signed16(0xF830), -2000);
        assert_eq!(signed16(2000), 2000);
    }

    #[rstest]
    #[case(0, "OK")]
    #[case(1, "FLOAT")]
    #[case(2, "STRIP")]
    #[case(3, "NG")]
    #[case(99, "99")]
    fn test_result_mapping(#[case] code: i64, #[case] expected: &str) {
        let result = TighteningResult::from_code(code);
        assert_eq!(result.to_string(), expected);
        assert_eq!(result.code(), code);
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(mode_label(1), Some("RS485/232"));
        assert_eq!(mode_label(2), None);
    }
}
