use serde_json::Value;

// Returns the JSON pointer to the first field in `expected` that isn't present in `actual` with the
// same value, or None if `expected` is a "subset" of `actual`.  Objects may have extra keys in
// `actual`; arrays must have the same length and match element-by-element.  A null in `expected`
// matches a missing field in `actual`.
pub fn first_mismatch(expected: &Value, actual: &Value) -> Option<String> {
    first_mismatch_at(expected, actual, String::new())
}

fn first_mismatch_at(expected: &Value, actual: &Value, ptr: String) -> Option<String> {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => e.iter().find_map(|(k, ev)| {
            let child = format!("{ptr}/{}", escape(k));
            match a.get(k) {
                Some(av) => first_mismatch_at(ev, av, child),
                None if ev.is_null() => None,
                None => Some(child),
            }
        }),
        (Value::Array(e), Value::Array(a)) if e.len() == a.len() => e
            .iter()
            .zip(a)
            .enumerate()
            .find_map(|(i, (ev, av))| first_mismatch_at(ev, av, format!("{ptr}/{i}"))),
        (e, a) if e == a => None,
        _ => Some(if ptr.is_empty() { "/".into() } else { ptr }),
    }
}

// https://datatracker.ietf.org/doc/html/rfc6901#section-3
fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
