//! Compact field-tagged binary reader (panic-free).
//!
//! Layout: each field starts with a header byte, high nibble = field id delta
//! (0 means an explicit zigzag varint i16 follows), low nibble = wire type.
//! A zero byte closes the current struct.
//!
//! Parsing rules:
//! - Never index (`buf[0]`); always use `Buf` and `remaining()` checks.
//! - Truncated input or an unknown wire type ends the walk; it never panics
//!   and never errors. Owning parsers decide whether what was read suffices.

use bytes::{Buf, Bytes};

const MAX_DEPTH: usize = 32;

/// Wire type nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Stop = 0,
    BoolTrue = 1,
    BoolFalse = 2,
    Byte = 3,
    I16 = 4,
    I32 = 5,
    I64 = 6,
    Double = 7,
    Binary = 8,
    List = 9,
    Set = 10,
    Map = 11,
    Struct = 12,
}

impl WireType {
    pub fn from_nibble(n: u8) -> Option<Self> {
        Some(match n {
            0 => WireType::Stop,
            1 => WireType::BoolTrue,
            2 => WireType::BoolFalse,
            3 => WireType::Byte,
            4 => WireType::I16,
            5 => WireType::I32,
            6 => WireType::I64,
            7 => WireType::Double,
            8 => WireType::Binary,
            9 => WireType::List,
            10 => WireType::Set,
            11 => WireType::Map,
            12 => WireType::Struct,
            _ => return None,
        })
    }
}

/// Decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    Binary(Bytes),
    List(Vec<FieldValue>),
    Map(Vec<(FieldValue, FieldValue)>),
    /// Only produced for structs nested in lists or maps; struct fields are
    /// otherwise delivered individually with their enclosing path.
    Struct(Vec<(i16, FieldValue)>),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Byte(v) => Some(i64::from(*v)),
            FieldValue::I16(v) => Some(i64::from(*v)),
            FieldValue::I32(v) => Some(i64::from(*v)),
            FieldValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            FieldValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Binary value as UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }
}

type Walk<T> = std::result::Result<T, &'static str>;

/// Stateless reader over one buffer.
pub struct FieldReader {
    buf: Bytes,
}

impl FieldReader {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Walk every field, invoking `on_field(path, field, value, wire_type)`.
    /// `path` holds the ids of the enclosing structs (empty at top level).
    pub fn read<F>(mut self, mut on_field: F)
    where
        F: FnMut(&[i16], i16, FieldValue, WireType),
    {
        let mut path = Vec::new();
        if let Err(reason) = walk_struct(&mut self.buf, &mut path, &mut on_field) {
            tracing::debug!(reason, remaining = self.buf.remaining(), "field walk ended early");
        }
    }
}

fn walk_struct<F>(buf: &mut Bytes, path: &mut Vec<i16>, on_field: &mut F) -> Walk<()>
where
    F: FnMut(&[i16], i16, FieldValue, WireType),
{
    if path.len() > MAX_DEPTH {
        return Err("nesting too deep");
    }
    let mut last = 0i16;
    while let Some((field, wire)) = read_field_header(buf, &mut last)? {
        if wire == WireType::Struct {
            path.push(field);
            walk_struct(buf, path, on_field)?;
            path.pop();
            continue;
        }
        let value = read_value(buf, wire, path.len())?;
        on_field(path, field, value, wire);
    }
    Ok(())
}

/// `None` on STOP or a cleanly exhausted buffer.
fn read_field_header(buf: &mut Bytes, last: &mut i16) -> Walk<Option<(i16, WireType)>> {
    if !buf.has_remaining() {
        return Ok(None);
    }
    let header = buf.get_u8();
    if header == 0 {
        return Ok(None);
    }
    let wire = WireType::from_nibble(header & 0x0f).ok_or("unknown wire type")?;
    let delta = header >> 4;
    let field = if delta == 0 {
        read_zigzag(buf)? as i16
    } else {
        last.wrapping_add(i16::from(delta))
    };
    *last = field;
    Ok(Some((field, wire)))
}

fn read_value(buf: &mut Bytes, wire: WireType, depth: usize) -> Walk<FieldValue> {
    Ok(match wire {
        WireType::Stop => return Err("unexpected stop"),
        WireType::BoolTrue => FieldValue::Bool(true),
        WireType::BoolFalse => FieldValue::Bool(false),
        WireType::Byte => {
            if buf.remaining() < 1 {
                return Err("truncated byte");
            }
            FieldValue::Byte(buf.get_i8())
        }
        WireType::I16 => FieldValue::I16(read_zigzag(buf)? as i16),
        WireType::I32 => FieldValue::I32(read_zigzag(buf)? as i32),
        WireType::I64 => FieldValue::I64(read_zigzag(buf)?),
        WireType::Double => {
            if buf.remaining() < 8 {
                return Err("truncated double");
            }
            FieldValue::Double(buf.get_f64_le())
        }
        WireType::Binary => {
            let len = read_varint(buf)? as usize;
            if buf.remaining() < len {
                return Err("truncated binary");
            }
            FieldValue::Binary(buf.copy_to_bytes(len))
        }
        WireType::List | WireType::Set => read_list(buf, depth)?,
        WireType::Map => read_map(buf, depth)?,
        WireType::Struct => FieldValue::Struct(read_struct_fields(buf, depth + 1)?),
    })
}

fn read_element(buf: &mut Bytes, wire: WireType, depth: usize) -> Walk<FieldValue> {
    match wire {
        // collection booleans carry their value in a byte
        WireType::BoolTrue | WireType::BoolFalse => {
            if buf.remaining() < 1 {
                return Err("truncated bool");
            }
            Ok(FieldValue::Bool(buf.get_u8() == 1))
        }
        other => read_value(buf, other, depth),
    }
}

fn read_list(buf: &mut Bytes, depth: usize) -> Walk<FieldValue> {
    if depth > MAX_DEPTH {
        return Err("nesting too deep");
    }
    if buf.remaining() < 1 {
        return Err("truncated list header");
    }
    let header = buf.get_u8();
    let size = match header >> 4 {
        15 => read_varint(buf)? as usize,
        n => usize::from(n),
    };
    let elem = WireType::from_nibble(header & 0x0f).ok_or("unknown list element type")?;
    let mut items = Vec::with_capacity(size.min(buf.remaining()));
    for _ in 0..size {
        items.push(read_element(buf, elem, depth + 1)?);
    }
    Ok(FieldValue::List(items))
}

fn read_map(buf: &mut Bytes, depth: usize) -> Walk<FieldValue> {
    if depth > MAX_DEPTH {
        return Err("nesting too deep");
    }
    let size = read_varint(buf)? as usize;
    if size == 0 {
        return Ok(FieldValue::Map(Vec::new()));
    }
    if buf.remaining() < 1 {
        return Err("truncated map header");
    }
    let kv = buf.get_u8();
    let key = WireType::from_nibble(kv >> 4).ok_or("unknown map key type")?;
    let val = WireType::from_nibble(kv & 0x0f).ok_or("unknown map value type")?;
    let mut entries = Vec::with_capacity(size.min(buf.remaining()));
    for _ in 0..size {
        let k = read_element(buf, key, depth + 1)?;
        let v = read_element(buf, val, depth + 1)?;
        entries.push((k, v));
    }
    Ok(FieldValue::Map(entries))
}

fn read_struct_fields(buf: &mut Bytes, depth: usize) -> Walk<Vec<(i16, FieldValue)>> {
    if depth > MAX_DEPTH {
        return Err("nesting too deep");
    }
    let mut out = Vec::new();
    let mut last = 0i16;
    while let Some((field, wire)) = read_field_header(buf, &mut last)? {
        out.push((field, read_value(buf, wire, depth)?));
    }
    Ok(out)
}

fn read_varint(buf: &mut Bytes) -> Walk<u64> {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        if !buf.has_remaining() {
            return Err("truncated varint");
        }
        let b = buf.get_u8();
        result |= u64::from(b & 0x7f) << shift;
        if b & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 64 {
            return Err("varint too long");
        }
    }
}

fn read_zigzag(buf: &mut Bytes) -> Walk<i64> {
    let n = read_varint(buf)?;
    Ok(((n >> 1) as i64) ^ -((n & 1) as i64))
}
