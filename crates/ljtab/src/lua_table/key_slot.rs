//! Key classification: array slot or hash chain.

use crate::lua_value::{LuaValue, float_to_integer};

/* Hash constants. Tuned using a brute force search. */
pub const HASH_BIAS: u32 = (-0x04c1_1db7_i32) as u32;
pub const HASH_ROT1: u32 = 14;
pub const HASH_ROT2: u32 = 5;
pub const HASH_ROT3: u32 = 13;

/// Where a key lives under the current array size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeySlot {
    /// Integer key inside `[0, asize)`.
    Array(u32),
    /// Everything else, with its 32-bit hash.
    Hash(u32),
}

/// Scramble two 32-bit words into a well-mixed hash.
#[inline(always)]
pub fn hashrot(mut lo: u32, mut hi: u32) -> u32 {
    lo ^= hi;
    hi = hi.rotate_left(HASH_ROT1);
    lo = lo.wrapping_sub(hi);
    hi = hi.rotate_left(HASH_ROT2);
    hi ^= lo;
    hi.wrapping_sub(lo.rotate_left(HASH_ROT3))
}

#[inline(always)]
fn hash_integer(i: i64) -> u32 {
    hashrot(i as u32, (i >> 32) as u32)
}

#[inline(always)]
fn hash_float(n: f64) -> u32 {
    let bits = n.to_bits();
    hashrot(bits as u32, ((bits >> 32) as u32) << 1)
}

/// Hash of a non-nil key. Floats with an integral value hash like the
/// equivalent integer, so both spellings reach the same chain.
#[inline]
pub fn hash_key(key: &LuaValue) -> u32 {
    match key {
        LuaValue::Nil => 0,
        LuaValue::Boolean(b) => *b as u32,
        LuaValue::Integer(i) => hash_integer(*i),
        LuaValue::Float(n) => match float_to_integer(*n) {
            Some(i) => hash_integer(i),
            None => hash_float(*n),
        },
        LuaValue::String(s) => s.sid(),
        LuaValue::Object(r) => {
            let raw = r.raw();
            hashrot(raw, raw.wrapping_add(HASH_BIAS))
        }
    }
}

/// Route a key. `None` for keys that can never be stored (nil, NaN).
#[inline(always)]
pub(crate) fn classify(key: &LuaValue, asize: u32) -> Option<KeySlot> {
    match key {
        LuaValue::Nil => None,
        LuaValue::Integer(i) => Some(classify_int(*i, asize)),
        LuaValue::Float(n) if n.is_nan() => None,
        LuaValue::Float(n) => match float_to_integer(*n) {
            Some(i) => Some(classify_int(i, asize)),
            None => Some(KeySlot::Hash(hash_float(*n))),
        },
        _ => Some(KeySlot::Hash(hash_key(key))),
    }
}

#[inline(always)]
pub(crate) fn classify_int(i: i64, asize: u32) -> KeySlot {
    if (i as u64) < asize as u64 {
        KeySlot::Array(i as u32)
    } else {
        KeySlot::Hash(hash_integer(i))
    }
}

/// Canonical stored form of a key: integral floats become integers.
#[inline]
pub(crate) fn normalize_key(key: LuaValue) -> Option<LuaValue> {
    match key {
        LuaValue::Nil => None,
        LuaValue::Float(n) if n.is_nan() => None,
        LuaValue::Float(n) => Some(match float_to_integer(n) {
            Some(i) => LuaValue::Integer(i),
            None => LuaValue::Float(n),
        }),
        other => Some(other),
    }
}
