// LuaValue - the key/value representation consumed by tables
//
// Only what the table core needs is modelled here: raw equality, a stable
// identity for collectable objects and the exact-integer test for numbers.
mod lua_string;

pub use lua_string::{LuaStr, StringInterner};

// ============ Object IDs ============
// All IDs are simple u32 indices - compact and efficient

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct TableId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct FunctionId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct UserdataId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct ThreadId(pub u32);

/// Object type tags (3 bits)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcType {
    Table = 1,
    Function = 2,
    Thread = 4,
    Userdata = 5,
}

/// Reference to a collectable object owned by the runtime.
/// Tables store the reference only; lifetime of the target is the owner's concern.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GcRef {
    Table(TableId),
    Function(FunctionId),
    Userdata(UserdataId),
    Thread(ThreadId),
}

impl GcRef {
    #[inline(always)]
    pub fn gc_type(self) -> GcType {
        match self {
            GcRef::Table(_) => GcType::Table,
            GcRef::Function(_) => GcType::Function,
            GcRef::Userdata(_) => GcType::Userdata,
            GcRef::Thread(_) => GcType::Thread,
        }
    }

    #[inline(always)]
    pub fn index(self) -> u32 {
        match self {
            GcRef::Table(TableId(id)) => id,
            GcRef::Function(FunctionId(id)) => id,
            GcRef::Userdata(UserdataId(id)) => id,
            GcRef::Thread(ThreadId(id)) => id,
        }
    }

    /// Identity packed as `[type: 3 bits][index: 29 bits]`.
    #[inline(always)]
    pub fn raw(self) -> u32 {
        ((self.gc_type() as u32) << 29) | (self.index() & 0x1FFF_FFFF)
    }
}

#[derive(Clone, Default)]
pub enum LuaValue {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(LuaStr),
    Object(GcRef),
}

/// 2^63 as f64; floats in `[-2^63, 2^63)` convert to i64 exactly when integral.
const I64_RANGE_END: f64 = 9_223_372_036_854_775_808.0;

/// Exact-integer test used for key normalisation.
#[inline]
pub(crate) fn float_to_integer(n: f64) -> Option<i64> {
    if n.fract() == 0.0 && n >= -I64_RANGE_END && n < I64_RANGE_END {
        Some(n as i64)
    } else {
        None
    }
}

impl LuaValue {
    #[inline(always)]
    pub const fn nil() -> Self {
        LuaValue::Nil
    }

    #[inline(always)]
    pub const fn integer(i: i64) -> Self {
        LuaValue::Integer(i)
    }

    #[inline(always)]
    pub const fn float(n: f64) -> Self {
        LuaValue::Float(n)
    }

    #[inline(always)]
    pub const fn boolean(b: bool) -> Self {
        LuaValue::Boolean(b)
    }

    #[inline(always)]
    pub fn string(s: LuaStr) -> Self {
        LuaValue::String(s)
    }

    #[inline(always)]
    pub const fn object(r: GcRef) -> Self {
        LuaValue::Object(r)
    }

    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    #[inline(always)]
    pub fn is_string(&self) -> bool {
        matches!(self, LuaValue::String(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            LuaValue::Nil => "nil",
            LuaValue::Boolean(_) => "boolean",
            LuaValue::Integer(_) | LuaValue::Float(_) => "number",
            LuaValue::String(_) => "string",
            LuaValue::Object(GcRef::Table(_)) => "table",
            LuaValue::Object(GcRef::Function(_)) => "function",
            LuaValue::Object(GcRef::Userdata(_)) => "userdata",
            LuaValue::Object(GcRef::Thread(_)) => "thread",
        }
    }

    /// Integer value of an integer, or of a float with an exact integer value.
    #[inline(always)]
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            LuaValue::Integer(i) => Some(i),
            LuaValue::Float(n) => float_to_integer(n),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LuaValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_lua_str(&self) -> Option<&LuaStr> {
        match self {
            LuaValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_object(&self) -> Option<GcRef> {
        match *self {
            LuaValue::Object(r) => Some(r),
            _ => None,
        }
    }

    /// Lua raw equality (no metamethods). Numbers compare by value across
    /// integer/float representations.
    pub fn raw_equal(&self, other: &LuaValue) -> bool {
        match (self, other) {
            (LuaValue::Nil, LuaValue::Nil) => true,
            (LuaValue::Boolean(a), LuaValue::Boolean(b)) => a == b,
            (LuaValue::Integer(a), LuaValue::Integer(b)) => a == b,
            (LuaValue::Float(a), LuaValue::Float(b)) => a == b,
            (LuaValue::Integer(i), LuaValue::Float(n)) | (LuaValue::Float(n), LuaValue::Integer(i)) => {
                float_to_integer(*n) == Some(*i)
            }
            (LuaValue::String(a), LuaValue::String(b)) => a == b,
            (LuaValue::Object(a), LuaValue::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for LuaValue {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.raw_equal(other)
    }
}

impl std::fmt::Debug for LuaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LuaValue::Nil => write!(f, "nil"),
            LuaValue::Boolean(b) => write!(f, "{b}"),
            LuaValue::Integer(i) => write!(f, "{i}"),
            LuaValue::Float(n) => write!(f, "{n:?}"),
            LuaValue::String(s) => write!(f, "{s:?}"),
            LuaValue::Object(r) => write!(f, "{}: {:#010x}", self.type_name(), r.raw()),
        }
    }
}

impl std::fmt::Display for LuaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LuaValue::Integer(i) => {
                let mut buffer = itoa::Buffer::new();
                f.write_str(buffer.format(*i))
            }
            LuaValue::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{n}")
                }
            }
            LuaValue::String(s) => f.write_str(s.as_str()),
            _ => write!(f, "{self:?}"),
        }
    }
}

impl From<bool> for LuaValue {
    fn from(b: bool) -> Self {
        LuaValue::Boolean(b)
    }
}

impl From<i64> for LuaValue {
    fn from(i: i64) -> Self {
        LuaValue::Integer(i)
    }
}

impl From<f64> for LuaValue {
    fn from(n: f64) -> Self {
        LuaValue::Float(n)
    }
}

impl From<LuaStr> for LuaValue {
    fn from(s: LuaStr) -> Self {
        LuaValue::String(s)
    }
}

impl From<GcRef> for LuaValue {
    fn from(r: GcRef) -> Self {
        LuaValue::Object(r)
    }
}
