//! Comparison primitives shared by the built-in scorers.

use std::collections::BTreeMap;

use serde_json::Value;

/// Trim, collapse whitespace runs to a single space, lowercase.
///
/// U+FEFF counts as whitespace alongside the Unicode `White_Space` set.
pub fn normalize_text(value: &str) -> String {
    value
        .split(|c: char| c.is_whitespace() || c == '\u{feff}')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Edit distance with unit insert/delete/substitute costs, over Unicode scalar values.
///
/// Two rolling rows, O(len(a) * len(b)) time and O(len(b)) space.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, a_char) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            let substitution = previous[j] + cost;
            current[j + 1] = deletion.min(insertion).min(substitution);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Same-value equality for JSON leaves.
///
/// Numbers compare by numeric value regardless of representation (`1 == 1.0`),
/// `NaN` equals `NaN`, and `0.0` differs from `-0.0`.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) if x.is_nan() && y.is_nan() => true,
                (Some(x), Some(y)) => x == y && x.is_sign_negative() == y.is_sign_negative(),
                _ => false,
            }
        }
        _ => a == b,
    }
}

/// Structural equality: arrays element-wise, objects by identical key sets,
/// leaves by [`same_value`].
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| deep_equal(x, y)))
        }
        (Value::Array(_), _) | (_, Value::Array(_)) => false,
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        _ => same_value(a, b),
    }
}

/// Flatten a value into dotted leaf paths (`a.b.0.c`).
///
/// Empty arrays and objects contribute no leaves.
pub fn flatten_leaves(value: &Value) -> BTreeMap<String, &Value> {
    let mut out = BTreeMap::new();
    collect_leaves(value, String::new(), &mut out);
    out
}

fn child_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

fn collect_leaves<'a>(value: &'a Value, path: String, out: &mut BTreeMap<String, &'a Value>) {
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_leaves(item, child_path(&path, &index.to_string()), out);
            }
        }
        Value::Object(fields) => {
            for (key, item) in fields {
                collect_leaves(item, child_path(&path, key), out);
            }
        }
        leaf => {
            out.insert(path, leaf);
        }
    }
}
