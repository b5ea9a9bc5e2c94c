use crate::value::{FALSE_WORDS, TRUE_WORDS, Value};

/// Decode backslash escapes: `\x` becomes `x` for any character `x`.
pub(crate) fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            // a trailing backslash stands for itself
            out.push(chars.next().unwrap_or('\\'));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Strip the `@` delimiters from a quoted literal and decode its escapes.
pub(super) fn unquote(s: &str) -> String {
    let inner = s.strip_prefix('@').and_then(|rest| rest.strip_suffix('@')).unwrap_or(s);
    unescape(inner)
}

/// Interpret a number lexeme.
///
/// A decimal point makes a float. Without one, the exponent is folded into an
/// integer by multiplying or integer-dividing by powers of ten, so `5e3` is
/// `5000` and `15e-1` is `1`.
pub(super) fn number(lexeme: &str) -> Result<Value, String> {
    let (mantissa, exponent) = match lexeme.find(['e', 'E']) {
        Some(idx) => (&lexeme[..idx], Some(&lexeme[idx + 1..])),
        None => (lexeme, None),
    };

    if mantissa.contains('.') {
        return lexeme
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("invalid number {lexeme:?}"));
    }

    let base: i64 = mantissa
        .parse()
        .map_err(|_| format!("number {lexeme:?} is out of range"))?;
    let Some(exponent) = exponent else {
        return Ok(Value::Int(base));
    };

    let (negative, digits) = match exponent.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, exponent),
    };
    let power = digits.parse::<u32>().ok().and_then(|e| 10i64.checked_pow(e));

    if negative {
        // dividing by anything larger than i64 leaves nothing
        Ok(Value::Int(power.map_or(0, |p| base / p)))
    } else {
        power
            .and_then(|p| base.checked_mul(p))
            .map(Value::Int)
            .ok_or_else(|| format!("number {lexeme:?} is out of range"))
    }
}

/// Map a boolean word (any case) to its value.
pub(super) fn boolean(lexeme: &str) -> Result<bool, String> {
    let upper = lexeme.to_uppercase();
    if TRUE_WORDS.contains(&upper.as_str()) {
        Ok(true)
    } else if FALSE_WORDS.contains(&upper.as_str()) {
        Ok(false)
    } else {
        Err(format!("{lexeme:?} is not a boolean; use true/false, on/off or yes/no"))
    }
}
