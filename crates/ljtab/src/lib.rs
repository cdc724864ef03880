// LuaJIT-style table core
// Hybrid array/hash tables for an embedded Lua runtime, with pluggable
// allocation accounting

#[cfg(test)]
mod test;

pub mod gc;
pub mod lua_error;
pub mod lua_limits;
pub mod lua_table;
pub mod lua_value;

pub use gc::{GcAccount, GcStats, SystemAllocator, TableAllocator};
pub use lua_error::{LuaError, LuaResult};
pub use lua_table::{LuaTable, TableIter, TableStats};
pub use lua_value::{
    FunctionId, GcRef, GcType, LuaStr, LuaValue, StringInterner, TableId, ThreadId, UserdataId,
};
