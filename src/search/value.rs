use super::FindOptions;
use crate::pattern::CompiledPattern;

/// How a search value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindMode {
    /// UTF-8 text or raw bytes
    #[default]
    Text,
    /// Hex pattern text (`DE ?? ..`) or raw bytes
    Hex,
    /// Unsigned integer of a fixed width
    Int,
    /// IEEE-754 float
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    /// Smallest width that holds `value`
    pub fn fitting(value: u64) -> Self {
        if value <= u8::MAX as u64 {
            IntWidth::W8
        } else if value <= u16::MAX as u64 {
            IntWidth::W16
        } else if value <= u32::MAX as u64 {
            IntWidth::W32
        } else {
            IntWidth::W64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatWidth {
    F32,
    #[default]
    F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// A value to search for or to write as a replacement
#[derive(Debug, Clone, PartialEq)]
pub enum FindValue {
    Text(String),
    Bytes(Vec<u8>),
    Unsigned(u64),
    Float(f64),
}

impl From<&str> for FindValue {
    fn from(s: &str) -> Self {
        FindValue::Text(s.to_string())
    }
}

impl From<String> for FindValue {
    fn from(s: String) -> Self {
        FindValue::Text(s)
    }
}

impl From<&[u8]> for FindValue {
    fn from(b: &[u8]) -> Self {
        FindValue::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for FindValue {
    fn from(b: Vec<u8>) -> Self {
        FindValue::Bytes(b)
    }
}

impl From<u64> for FindValue {
    fn from(n: u64) -> Self {
        FindValue::Unsigned(n)
    }
}

impl From<f64> for FindValue {
    fn from(f: f64) -> Self {
        FindValue::Float(f)
    }
}

/// Bytes denoted by `value` under `options.mode`; empty when it cannot be encoded.
pub fn encode(value: &FindValue, options: &FindOptions) -> Vec<u8> {
    match options.mode {
        FindMode::Text => match value {
            FindValue::Text(s) => s.as_bytes().to_vec(),
            FindValue::Bytes(b) => b.clone(),
            FindValue::Unsigned(n) => n.to_string().into_bytes(),
            FindValue::Float(f) => f.to_string().into_bytes(),
        },
        FindMode::Hex => match value {
            FindValue::Text(s) => CompiledPattern::compile(s)
                .literal_bytes()
                .unwrap_or_default(),
            FindValue::Bytes(b) => b.clone(),
            _ => Vec::new(),
        },
        FindMode::Int => unsigned_of(value)
            .map(|n| encode_int(n, options))
            .unwrap_or_default(),
        FindMode::Float => float_of(value)
            .map(|f| encode_float(f, options))
            .unwrap_or_default(),
    }
}

/// `u64::MAX as f64` rounds up to this, so the bound must be exclusive
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

fn unsigned_of(value: &FindValue) -> Option<u64> {
    match value {
        FindValue::Unsigned(n) => Some(*n),
        FindValue::Text(s) => parse_unsigned(s.trim()),
        FindValue::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f < TWO_POW_64 => {
            Some(*f as u64)
        }
        _ => None,
    }
}

fn parse_unsigned(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn float_of(value: &FindValue) -> Option<f64> {
    match value {
        FindValue::Float(f) => Some(*f),
        FindValue::Unsigned(n) => Some(*n as f64),
        FindValue::Text(s) => s.trim().parse().ok(),
        FindValue::Bytes(_) => None,
    }
}

fn encode_int(n: u64, options: &FindOptions) -> Vec<u8> {
    let width = options.int_width.unwrap_or_else(|| IntWidth::fitting(n));
    if IntWidth::fitting(n) > width {
        return Vec::new();
    }

    let big = options.byte_order == ByteOrder::Big;
    macro_rules! bytes {
        ($t:ty) => {{
            let v = n as $t;
            if big {
                v.to_be_bytes().to_vec()
            } else {
                v.to_le_bytes().to_vec()
            }
        }};
    }

    match width {
        IntWidth::W8 => vec![n as u8],
        IntWidth::W16 => bytes!(u16),
        IntWidth::W32 => bytes!(u32),
        IntWidth::W64 => bytes!(u64),
    }
}

fn encode_float(f: f64, options: &FindOptions) -> Vec<u8> {
    let big = options.byte_order == ByteOrder::Big;
    match (options.float_width, big) {
        (FloatWidth::F32, false) => (f as f32).to_le_bytes().to_vec(),
        (FloatWidth::F32, true) => (f as f32).to_be_bytes().to_vec(),
        (FloatWidth::F64, false) => f.to_le_bytes().to_vec(),
        (FloatWidth::F64, true) => f.to_be_bytes().to_vec(),
    }
}
