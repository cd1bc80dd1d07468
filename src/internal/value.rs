//! The runtime value model and the string-alignment helpers built on top of
//! it (§3, §4.6).
//!
//! `Value` is a small tagged union. Falsy values are `Empty`, `Int(0)`,
//! `Float(0.0)`, and the empty `List` — everything else, including
//! non-empty strings and pairs, is truthy.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Int(i64),
    Float(f64),
    List(Vec<Value>),
    Pair(Box<Value>, Box<Value>),
    Str(String),
    Empty,
}

impl Value {
    pub fn pair(a: Value, b: Value) -> Value {
        Value::Pair(Box::new(a), Box::new(b))
    }

    /// Falsy values are `Empty`, zero (integer or float), and the empty
    /// list; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Int(0) => false,
            Value::Float(f) => *f != 0.0,
            Value::List(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// Treats a scalar as a one-element bag and `Empty` as an empty bag, so
    /// every aggregation operator can work uniformly over "a list or the
    /// thing a list would have contained" (§4.3: "a scalar is treated as a
    /// singleton").
    pub fn into_bag(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            Value::Empty => Vec::new(),
            other => vec![other],
        }
    }

    pub fn as_bag(&self) -> Vec<Value> {
        self.clone().into_bag()
    }

    /// Numeric value as `f64`, for arithmetic that must promote to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    fn as_text_block(&self) -> Vec<String> {
        match self {
            Value::Str(s) => s.split('\n').map(|line| line.to_string()).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Empty => write!(f, ""),
            Value::Pair(a, b) => write!(f, "[{a},{b}]"),
            Value::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// The four stacking operators from §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    Left,
    Right,
    Center,
}

fn pad(cell: &str, width: usize, justify: Justify) -> String {
    let len = cell.chars().count();
    if len >= width {
        return cell.to_string();
    }
    let gap = width - len;
    match justify {
        Justify::Left => format!("{cell}{}", " ".repeat(gap)),
        Justify::Right => format!("{}{cell}", " ".repeat(gap)),
        Justify::Center => {
            let left = gap / 2;
            let right = gap - left;
            format!("{}{cell}{}", " ".repeat(left), " ".repeat(right))
        }
    }
}

/// Stacks `left`'s rows above `right`'s rows, padding every row (from both
/// blocks) to the width of the widest cell in either block.
fn stack(left: &Value, right: &Value, justify: Justify) -> Value {
    let lb = left.as_text_block();
    let rb = right.as_text_block();
    let width = lb
        .iter()
        .chain(rb.iter())
        .map(|r| r.chars().count())
        .max()
        .unwrap_or(0);
    let rows: Vec<String> = lb
        .iter()
        .chain(rb.iter())
        .map(|r| pad(r, width, justify))
        .collect();
    Value::Str(rows.join("\n"))
}

/// Places `left`'s block and `right`'s block side by side, padding the
/// shorter column with blank rows up to the taller column's height.
fn side_by_side(left: &Value, right: &Value) -> Value {
    let lb = left.as_text_block();
    let rb = right.as_text_block();
    let lw = lb.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let rw = rb.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let height = lb.len().max(rb.len());
    let empty = String::new();
    let mut rows = Vec::with_capacity(height);
    for i in 0..height {
        let lcell = lb.get(i).unwrap_or(&empty);
        let rcell = rb.get(i).unwrap_or(&empty);
        rows.push(format!(
            "{}{}",
            pad(lcell, lw, Justify::Left),
            pad(rcell, rw, Justify::Left)
        ));
    }
    Value::Str(rows.join("\n"))
}

/// Combines two values as text blocks per the operator in `op`
/// (`|>`, `<|`, `<>`, `||` — see [`crate::internal::ast::TextAlignOp`]).
///
/// This is the one primitive both the `TextAlign` operator and an
/// (out-of-core) embedded-marker string preprocessor would call; trill
/// itself does not parse alignment markers out of string literal contents
/// (§1 names that module an external collaborator).
pub fn text_align(left: &Value, right: &Value, op: crate::internal::ast::TextAlignOp) -> Value {
    use crate::internal::ast::TextAlignOp::*;
    match op {
        LeftStack => stack(left, right, Justify::Left),
        RightStack => stack(left, right, Justify::Right),
        CenterStack => stack(left, right, Justify::Center),
        SideBySide => side_by_side(left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::ast::TextAlignOp;

    #[test]
    fn truthiness_matches_spec() {
        assert!(!Value::Empty.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::Str(String::new()).is_truthy());
    }

    #[test]
    fn into_bag_promotes_scalars_and_empties_empty() {
        assert_eq!(Value::Int(5).into_bag(), vec![Value::Int(5)]);
        assert_eq!(Value::Empty.into_bag(), Vec::<Value>::new());
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).into_bag(),
            vec![Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn left_stack_pads_to_widest_cell_across_both_blocks() {
        let step1 = text_align(
            &Value::Str("1".into()),
            &Value::Str("two".into()),
            TextAlignOp::LeftStack,
        );
        let step2 = text_align(&step1, &Value::Str("three".into()), TextAlignOp::LeftStack);
        assert_eq!(step2, Value::Str("1    \ntwo  \nthree".into()));
    }

    #[test]
    fn side_by_side_pads_shorter_column_with_blank_rows() {
        let left = Value::Str("a\nbb".into());
        let right = Value::Str("c".into());
        let result = side_by_side(&left, &right);
        assert_eq!(result, Value::Str("ac\nbb ".into()));
    }
}
