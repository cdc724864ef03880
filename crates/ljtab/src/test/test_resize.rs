// Tests for rehash and explicit resizing
use crate::*;
use std::collections::HashSet;

#[test]
fn test_sequential_keys_end_in_array() {
    for n in [1, 7, 64, 1000] {
        let mut t = LuaTable::new(0, 0);
        for i in 0..n {
            t.set(LuaValue::integer(i), LuaValue::integer(i)).unwrap();
        }
        assert!(t.is_array(), "n = {n}");
        assert!(t.asize() as i64 >= n);
        assert_eq!(t.stats().hash_live, 0);
        assert_eq!(t.key_count(), n as u32);
    }
}

#[test]
fn test_float_spelled_sequence_ends_in_array() {
    let mut t = LuaTable::new(0, 0);
    for i in 0..100 {
        t.set(LuaValue::float(i as f64), LuaValue::integer(i)).unwrap();
    }
    assert!(t.is_array());
    assert_eq!(t.length(), 100);
}

#[test]
fn test_forced_resizes_keep_every_pair() {
    let mut interner = StringInterner::new();
    let mut t = LuaTable::new(0, 0);
    for i in 0..500i64 {
        let name = format!("k{i}");
        t.set_str(interner.intern(&name), LuaValue::integer(i)).unwrap();
        t.set_int(i * 1000 + 7, LuaValue::integer(-i)).unwrap();
    }
    assert_eq!(t.key_count(), 1000);
    for i in 0..500i64 {
        let name = format!("k{i}");
        assert_eq!(t.get_str(&interner.intern(&name)), Some(&LuaValue::integer(i)));
        assert_eq!(t.get_int(i * 1000 + 7), Some(&LuaValue::integer(-i)));
    }
    let seen: HashSet<String> = t.iter().map(|(k, _)| format!("{k:?}")).collect();
    assert_eq!(seen.len(), 1000);
    assert_eq!(t.iter().count(), 1000);
}

#[test]
fn test_reverse_fill() {
    let mut t = LuaTable::new(0, 0);
    for i in (0..100).rev() {
        t.set_int(i, LuaValue::integer(i)).unwrap();
    }
    for i in 0..100 {
        assert_eq!(t.get_int(i), Some(&LuaValue::integer(i)));
    }
    assert_eq!(t.key_count(), 100);
    assert_eq!(t.length(), 100);
}

#[test]
fn test_rehash_drops_dead_keys() {
    let mut interner = StringInterner::new();
    let mut t = LuaTable::new(0, 16);
    let keys: Vec<LuaStr> = (0..16).map(|i| interner.intern(&format!("s{i}"))).collect();
    for key in &keys {
        t.set_str(key.clone(), LuaValue::boolean(true)).unwrap();
    }
    assert_eq!(t.hash_capacity(), 16);
    for key in &keys[..8] {
        t.remove(&LuaValue::string(key.clone()));
    }
    assert_eq!(t.stats().hash_dead, 8);

    // every node holds a key, live or dead: this insert rebuilds
    t.set_str(interner.intern("t0"), LuaValue::boolean(true)).unwrap();
    let stats = t.stats();
    assert_eq!(stats.hash_dead, 0);
    assert_eq!(stats.hash_live, 9);
    assert_eq!(t.key_count(), 9);
    for key in &keys[8..] {
        assert!(t.get_str(key).is_some());
    }
}

#[test]
fn test_resize_array_moves_keys_both_ways() {
    let mut t = LuaTable::new(0, 16);
    for i in 5..11 {
        t.set_int(i, LuaValue::integer(i)).unwrap();
    }
    assert_eq!(t.asize(), 0);

    t.resize_array(16).unwrap();
    assert_eq!(t.asize(), 16);
    assert!(t.is_array());
    assert_eq!(t.stats().array_live, 6);

    t.resize_array(0).unwrap();
    assert_eq!(t.asize(), 0);
    assert_eq!(t.stats().hash_live, 6);
    for i in 5..11 {
        assert_eq!(t.get_int(i), Some(&LuaValue::integer(i)));
    }
    assert_eq!(t.key_count(), 6);
}

#[test]
fn test_resize_array_grows_hash_when_needed() {
    let mut t = LuaTable::new(0, 0);
    for i in 0..32 {
        t.set_int(i, LuaValue::integer(i)).unwrap();
    }
    assert_eq!(t.hash_capacity(), 0);
    t.resize_array(8).unwrap();
    assert_eq!(t.asize(), 8);
    assert!(t.hash_capacity() >= 24);
    assert_eq!(t.length(), 32);
    assert_eq!(t.key_count(), 32);
}
