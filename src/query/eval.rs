//! Predicate evaluation over property bags
//!
//! Absent fields and literals that cannot be read as the field's type never
//! match, whatever the operator (except `IS NULL`).

use crate::properties::dates::parse_descriptive_date;
use crate::properties::{PropertyBag, PropertyValue};
use crate::query::{Condition, Literal, Operator};

pub fn matches_condition(condition: &Condition, bag: &PropertyBag) -> bool {
    let value = bag.get(&condition.field);
    match condition.op {
        Operator::Is => value.map(PropertyValue::is_null).unwrap_or(true),
        Operator::IsNot => value.map(|v| !v.is_null()).unwrap_or(false),
        Operator::Eq => value.and_then(|v| equals(v, &condition.literal)) == Some(true),
        Operator::Ne => value.and_then(|v| equals(v, &condition.literal)) == Some(false),
        Operator::Like => match (value.and_then(PropertyValue::as_text), &condition.literal) {
            (Some(text), Literal::String(pattern)) => like(pattern, &text),
            _ => false,
        },
    }
}

/// Typed equality; `None` when the two sides are not comparable.
fn equals(value: &PropertyValue, literal: &Literal) -> Option<bool> {
    match (value, literal) {
        (PropertyValue::Null, _) | (_, Literal::Null) => None,
        (PropertyValue::String(s) | PropertyValue::Id(s), Literal::String(l)) => Some(s == l),
        (PropertyValue::Integer(i), Literal::Integer(l)) => Some(i == l),
        (PropertyValue::Integer(i), Literal::String(l)) => l.trim().parse::<i64>().ok().map(|l| *i == l),
        (PropertyValue::Boolean(b), Literal::Boolean(l)) => Some(b == l),
        (PropertyValue::Boolean(b), Literal::String(l)) => match l.to_ascii_lowercase().as_str() {
            "true" => Some(*b),
            "false" => Some(!*b),
            _ => None,
        },
        (PropertyValue::DateTime(d), Literal::String(l)) => parse_descriptive_date(l).map(|l| *d == l),
        (PropertyValue::IdList(ids), Literal::String(l)) => Some(ids.iter().any(|id| id == l)),
        _ => None,
    }
}

/// SQL LIKE: `%` matches any run, `_` exactly one character. Case-sensitive.
pub fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    // Position of the last `%` and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('_') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}
