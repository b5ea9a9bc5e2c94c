//! Scalar values manipulated by `TunaScript`.
//!
//! A [`Value`] is always exactly one of four variants. Every operation is total:
//! mismatched operands are coerced toward the *left* operand's variant, and
//! coercions that cannot succeed (such as `"abc"` as a number) fall back to the
//! zero value of the target type instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};
use variantly::Variantly;

/// Characters that must be escaped for text to survive as an unquoted literal.
const SENSITIVE_CHARS: &[char] = &[
    '\\', '@', ',', '+', '-', '<', '>', '!', '=', '*', '/', '&', '|', '(', ')', '$',
];

/// Words that lex as boolean literals rather than text (compared case-insensitively).
pub(crate) const TRUE_WORDS: [&str; 3] = ["TRUE", "ON", "YES"];
pub(crate) const FALSE_WORDS: [&str; 3] = ["FALSE", "OFF", "NO"];

/// Upper bound on the length of text built by repetition (`@ab@ * 3`).
pub const MAX_REPEAT_BYTES: usize = 1 << 20;

/// A `TunaScript` scalar.
///
/// The default value is `Int(0)`, which is also what an unset flag reads as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Variantly)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Text(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("ON"),
            Value::Bool(false) => f.write_str("OFF"),
        }
    }
}

/// Nine fractional digits with trailing zeros dropped, keeping at least one.
fn format_float(x: f64) -> String {
    let mut s = format!("{x:.9}");
    if s.contains('.') {
        let trimmed_len = s.trim_end_matches('0').len();
        s.truncate(trimmed_len);
        if s.ends_with('.') {
            s.push('0');
        }
    }
    s
}

impl Value {
    /// Infer a value from free-form text, as used for flag values supplied
    /// outside of `TunaScript` source (command lines, debug consoles).
    ///
    /// Boolean words win, then anything containing a `.` that parses as a float,
    /// then integers. Everything else is kept as text.
    pub fn parse_loose(s: &str) -> Value {
        let upper = s.to_uppercase();
        if TRUE_WORDS.contains(&upper.as_str()) {
            return Value::Bool(true);
        }
        if FALSE_WORDS.contains(&upper.as_str()) {
            return Value::Bool(false);
        }
        if s.contains('.')
            && let Ok(f) = s.parse::<f64>()
        {
            return Value::Float(f);
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
        Value::Text(s.to_string())
    }

    /// Integer view of the value. Floats round half away from zero and
    /// unparsable text is 0.
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            Value::Float(f) => f.round() as i64,
            Value::Text(s) => s.parse().unwrap_or(0),
            Value::Bool(b) => i64::from(*b),
        }
    }

    /// Float view of the value. Unparsable text is 0.0.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) => s.parse().unwrap_or(0.0),
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            },
        }
    }

    /// Truthiness: nonzero numbers and non-empty text are true.
    pub fn cast_to_bool(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Bool(b) => *b,
        }
    }

    pub fn cast_to_string(&self) -> String {
        self.to_string()
    }

    /// Numbers are returned unchanged; anything else becomes an `Int`.
    pub fn cast_to_number(&self) -> Value {
        match self {
            Value::Int(_) | Value::Float(_) => self.clone(),
            _ => Value::Int(self.as_int()),
        }
    }

    fn either_float(&self, other: &Value) -> bool {
        self.is_float() || other.is_float()
    }

    /// Text on the left concatenates; otherwise numeric addition, in `Float`
    /// when either side is a float.
    pub fn add(&self, other: &Value) -> Value {
        match self {
            Value::Text(s) => Value::Text(format!("{s}{other}")),
            _ if self.either_float(other) => Value::Float(self.as_float() + other.as_float()),
            _ => Value::Int(self.as_int().wrapping_add(other.as_int())),
        }
    }

    pub fn subtract(&self, other: &Value) -> Value {
        if self.either_float(other) {
            Value::Float(self.as_float() - other.as_float())
        } else {
            Value::Int(self.as_int().wrapping_sub(other.as_int()))
        }
    }

    /// Text on the left repeats `max(other, 0)` times, keeping only as many
    /// whole copies as fit in [`MAX_REPEAT_BYTES`].
    pub fn multiply(&self, other: &Value) -> Value {
        match self {
            Value::Text(s) => {
                let times = usize::try_from(other.as_int())
                    .unwrap_or(0)
                    .min(MAX_REPEAT_BYTES / s.len().max(1));
                Value::Text(s.repeat(times))
            },
            _ if self.either_float(other) => Value::Float(self.as_float() * other.as_float()),
            _ => Value::Int(self.as_int().wrapping_mul(other.as_int())),
        }
    }

    /// Integer division only when it is exact; any remainder (or a zero
    /// divisor) falls back to float division.
    #[allow(clippy::cast_precision_loss)]
    pub fn divide(&self, other: &Value) -> Value {
        if self.either_float(other) {
            return Value::Float(self.as_float() / other.as_float());
        }
        let (n, d) = (self.as_int(), other.as_int());
        match n.checked_rem(d) {
            Some(0) => Value::Int(n.wrapping_div(d)),
            _ => Value::Float(n as f64 / d as f64),
        }
    }

    pub fn negate(&self) -> Value {
        match self {
            Value::Float(f) => Value::Float(-f),
            _ => Value::Int(self.as_int().wrapping_neg()),
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.cast_to_bool())
    }

    pub fn and(&self, other: &Value) -> Value {
        Value::Bool(self.cast_to_bool() && other.cast_to_bool())
    }

    pub fn or(&self, other: &Value) -> Value {
        Value::Bool(self.cast_to_bool() || other.cast_to_bool())
    }

    /// Left-biased equality: `other` is converted to this value's variant
    /// before comparing, so `a.equal_to(b)` and `b.equal_to(a)` can differ.
    #[allow(clippy::float_cmp)]
    pub fn equal_to(&self, other: &Value) -> bool {
        match self {
            Value::Text(s) => *s == other.to_string(),
            Value::Bool(b) => *b == other.cast_to_bool(),
            Value::Float(f) => *f == other.as_float(),
            Value::Int(i) => *i == other.as_int(),
        }
    }

    /// Numeric ordering; integer comparison only when both sides are `Int`.
    pub fn less_than(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a < b,
            _ => self.as_float() < other.as_float(),
        }
    }

    pub fn less_or_equal(&self, other: &Value) -> bool {
        self.less_than(other) || self.equal_to(other)
    }

    pub fn greater_than(&self, other: &Value) -> bool {
        !self.less_or_equal(other)
    }

    pub fn greater_or_equal(&self, other: &Value) -> bool {
        !self.less_than(other)
    }

    /// The value as it would be written as an unquoted `TunaScript` literal.
    pub fn escaped(&self) -> String {
        let raw = self.to_string();
        let last = raw.chars().count().saturating_sub(1);
        let mut out = String::with_capacity(raw.len() + 4);
        for (i, ch) in raw.chars().enumerate() {
            let edge_space = ch.is_whitespace() && (i == 0 || i == last);
            if SENSITIVE_CHARS.contains(&ch) || edge_space || matches!(ch, '\n' | '\r') {
                out.push('\\');
            }
            out.push(ch);
        }
        out
    }

    /// The value wrapped in `@` quotes with inner `@` and `\` escaped.
    pub fn quoted(&self) -> String {
        let raw = self.to_string();
        let mut out = String::with_capacity(raw.len() + 2);
        out.push('@');
        for ch in raw.chars() {
            if ch == '@' || ch == '\\' {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('@');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn truthiness() {
        assert!(Value::Bool(true).cast_to_bool());
        assert!(!Value::Int(0).cast_to_bool());
        assert!(!text("").cast_to_bool());
        assert!(text("x").cast_to_bool());
        assert!(Value::Float(0.1).cast_to_bool());
        assert!(!Value::Float(0.0).cast_to_bool());
    }

    #[test]
    fn add_follows_left_operand() {
        assert_eq!(text("ab").add(&Value::Int(2)), text("ab2"));
        assert_eq!(Value::Int(1).add(&Value::Float(2.5)), Value::Float(3.5));
        assert_eq!(Value::Int(1).add(&Value::Int(2)), Value::Int(3));
        assert_eq!(Value::Int(1).add(&text("2")), Value::Int(3));
        assert_eq!(Value::Bool(true).add(&Value::Int(1)), Value::Int(2));
    }

    #[test]
    fn divide_keeps_ints_when_exact() {
        assert_eq!(Value::Int(7).divide(&Value::Int(2)), Value::Float(3.5));
        assert_eq!(Value::Int(6).divide(&Value::Int(2)), Value::Int(3));
        assert_eq!(Value::Float(6.0).divide(&Value::Int(2)), Value::Float(3.0));
    }

    #[test]
    fn divide_by_zero_degrades_to_float() {
        assert_eq!(Value::Int(1).divide(&Value::Int(0)), Value::Float(f64::INFINITY));
        assert!(matches!(Value::Int(0).divide(&Value::Int(0)), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn int_arithmetic_wraps() {
        assert_eq!(Value::Int(i64::MAX).add(&Value::Int(1)), Value::Int(i64::MIN));
        assert_eq!(Value::Int(i64::MIN).negate(), Value::Int(i64::MIN));
    }

    #[test]
    fn multiply_repeats_text() {
        assert_eq!(text("ab").multiply(&Value::Int(3)), text("ababab"));
        assert_eq!(text("ab").multiply(&Value::Int(-2)), text(""));
        assert_eq!(text("").multiply(&Value::Int(i64::MAX)), text(""));
        assert_eq!(Value::Int(3).multiply(&Value::Float(0.5)), Value::Float(1.5));
    }

    #[test]
    fn repeated_text_is_capped() {
        let Value::Text(long) = text("ab").multiply(&Value::Int(1_000_000_000_000)) else {
            panic!("text times int is text");
        };
        assert_eq!(long.len(), MAX_REPEAT_BYTES);
        assert!(long.starts_with("abab"));

        let Value::Text(odd) = text("abc").multiply(&Value::Int(i64::MAX)) else {
            panic!("text times int is text");
        };
        assert_eq!(odd.len(), MAX_REPEAT_BYTES / 3 * 3);
    }

    #[test]
    fn equality_is_left_biased() {
        assert!(Value::Float(1.0).equal_to(&text("1")));
        assert!(!text("1").equal_to(&Value::Float(1.0)));
        assert!(Value::Bool(true).equal_to(&text("anything")));
        assert!(!text("anything").equal_to(&Value::Bool(true)));
    }

    #[test]
    fn ordering_is_derived_from_less_than() {
        let two = Value::Int(2);
        let three = Value::Float(3.0);
        assert!(two.less_than(&three));
        assert!(two.less_or_equal(&three));
        assert!(!two.greater_than(&three));
        assert!(three.greater_or_equal(&Value::Int(3)));
        assert!(!Value::Int(3).greater_than(&Value::Int(3)));
    }

    #[test]
    fn coercions_fall_back_to_zero() {
        assert_eq!(text("abc").as_int(), 0);
        assert_eq!(text("abc").as_float(), 0.0);
        assert_eq!(Value::Float(2.5).as_int(), 3);
        assert_eq!(Value::Float(-2.5).as_int(), -3);
        assert_eq!(text("12").cast_to_number(), Value::Int(12));
        assert_eq!(Value::Float(1.5).cast_to_number(), Value::Float(1.5));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(1.0 / 3.0).to_string(), "0.333333333");
        assert_eq!(Value::Bool(true).to_string(), "ON");
        assert_eq!(Value::Bool(false).to_string(), "OFF");
        assert_eq!(Value::Int(-4).to_string(), "-4");
    }

    #[test]
    fn escaping_and_quoting() {
        assert_eq!(text("a+b").escaped(), "a\\+b");
        assert_eq!(text(" pad ").escaped(), "\\ pad\\ ");
        assert_eq!(text("$5 (ish)").escaped(), "\\$5 \\(ish\\)");
        assert_eq!(text("mail@host\\x").quoted(), "@mail\\@host\\\\x@");
    }

    #[test]
    fn loose_parsing() {
        assert_eq!(Value::parse_loose("Yes"), Value::Bool(true));
        assert_eq!(Value::parse_loose("off"), Value::Bool(false));
        assert_eq!(Value::parse_loose("1.25"), Value::Float(1.25));
        assert_eq!(Value::parse_loose("42"), Value::Int(42));
        assert_eq!(Value::parse_loose("1e3"), text("1e3"));
        assert_eq!(Value::parse_loose("hello"), text("hello"));
    }

    #[test]
    fn variant_predicates() {
        assert!(Value::default().is_int());
        assert!(text("x").is_text());
        assert!(!Value::Bool(true).is_float());
    }
}
