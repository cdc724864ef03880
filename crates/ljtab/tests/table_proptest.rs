// LuaTable property tests.
//
// Model: std HashMap from a key description to the stored integer.
//  - Keys: small integers (array candidates, including negatives), far
//    integers (always hash), integral floats (alias the integer key) and
//    interned strings.
//  - Operations: set, set nil, remove, clear, resize_array.
//  - Invariant after each step: get(k) == model[k] for the touched key,
//    key_count() == model.len().
//  - At the end: a full traversal visits exactly the model keys once each,
//    length() is a border, and a clone compares equal pair by pair.
use std::collections::HashMap;

use ljtab::{LuaTable, LuaValue, StringInterner};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ModelKey {
    Int(i64),
    Str(u8),
}

#[derive(Debug, Clone)]
enum Op {
    Set(ModelKey, i64),
    SetFloat(i64, i64),
    SetNil(ModelKey),
    Remove(ModelKey),
    Clear,
    ResizeArray(u32),
}

fn model_key() -> impl Strategy<Value = ModelKey> {
    prop_oneof![
        4 => (-4i64..64).prop_map(ModelKey::Int),
        1 => (1_000i64..1_100).prop_map(|i| ModelKey::Int(i * 1_000_003)),
        2 => (0u8..32).prop_map(ModelKey::Str),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => (model_key(), any::<i64>()).prop_map(|(k, v)| Op::Set(k, v)),
        2 => (0i64..64, any::<i64>()).prop_map(|(k, v)| Op::SetFloat(k, v)),
        2 => model_key().prop_map(Op::SetNil),
        3 => model_key().prop_map(Op::Remove),
        1 => Just(Op::Clear),
        1 => (0u32..80).prop_map(Op::ResizeArray),
    ]
}

fn to_value(key: ModelKey, strings: &mut StringInterner) -> LuaValue {
    match key {
        ModelKey::Int(i) => LuaValue::integer(i),
        ModelKey::Str(s) => LuaValue::string(strings.intern(&format!("s{s}"))),
    }
}

fn from_value(key: &LuaValue) -> ModelKey {
    match key.as_lua_str() {
        Some(s) => ModelKey::Str(s.as_str()[1..].parse().unwrap()),
        None => ModelKey::Int(key.as_integer().unwrap()),
    }
}

fn check_border(t: &LuaTable, n: u32) -> bool {
    (n == 0 || t.get_int(n as i64 - 1).is_some()) && t.get_int(n as i64).is_none()
}

proptest! {
    #[test]
    fn prop_table_matches_model(ops in proptest::collection::vec(op(), 1..300)) {
        let mut strings = StringInterner::new();
        let mut t = LuaTable::new(0, 0);
        let mut model: HashMap<ModelKey, i64> = HashMap::new();

        for op in ops {
            let touched = match op {
                Op::Set(k, v) => {
                    t.set(to_value(k, &mut strings), LuaValue::integer(v)).unwrap();
                    model.insert(k, v);
                    Some(k)
                }
                Op::SetFloat(k, v) => {
                    t.set(LuaValue::float(k as f64), LuaValue::integer(v)).unwrap();
                    model.insert(ModelKey::Int(k), v);
                    Some(ModelKey::Int(k))
                }
                Op::SetNil(k) => {
                    t.set(to_value(k, &mut strings), LuaValue::nil()).unwrap();
                    model.remove(&k);
                    Some(k)
                }
                Op::Remove(k) => {
                    let removed = t.remove(&to_value(k, &mut strings));
                    prop_assert_eq!(removed, model.remove(&k).map(LuaValue::integer));
                    Some(k)
                }
                Op::Clear => {
                    t.clear();
                    model.clear();
                    None
                }
                Op::ResizeArray(n) => {
                    t.resize_array(n).unwrap();
                    prop_assert_eq!(t.asize(), n);
                    None
                }
            };

            if let Some(k) = touched {
                let key = to_value(k, &mut strings);
                prop_assert_eq!(t.get(&key).cloned(), model.get(&k).copied().map(LuaValue::integer));
            }
            prop_assert_eq!(t.key_count() as usize, model.len());
            prop_assert_eq!(t.is_empty(), model.is_empty());
        }

        let mut seen: HashMap<ModelKey, i64> = HashMap::new();
        for (k, v) in t.iter() {
            let k = from_value(&k);
            prop_assert!(seen.insert(k, v.as_integer().unwrap()).is_none());
        }
        prop_assert_eq!(&seen, &model);

        let n = t.length();
        prop_assert!(check_border(&t, n), "length {} is not a border", n);

        let is_array = model.keys().all(|k| matches!(k, ModelKey::Int(i) if *i >= 0 && *i < t.asize() as i64));
        prop_assert_eq!(t.is_array(), is_array);

        let copy = t.clone();
        let a: Vec<_> = t.iter().map(|(k, v)| (k, v.clone())).collect();
        let b: Vec<_> = copy.iter().map(|(k, v)| (k, v.clone())).collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_next_survives_removal_of_visited_keys(keys in proptest::collection::hash_set(-8i64..4096, 1..200)) {
        let mut t = LuaTable::new(0, 0);
        for &k in &keys {
            t.set_int(k, LuaValue::integer(k)).unwrap();
        }

        let mut visited = 0usize;
        let mut key = None;
        while let Some(k) = t.next(key.as_ref()).map(|(k, _)| k) {
            visited += 1;
            prop_assert!(t.remove(&k).is_some());
            key = Some(k);
        }
        prop_assert_eq!(visited, keys.len());
        prop_assert!(t.is_empty());
    }
}
