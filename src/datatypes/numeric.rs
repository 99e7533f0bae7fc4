//! Integer, float, and boolean inference.

use crate::types::Value;

/// Remove quote characters and spaces that commonly wrap numbers in exported text.
fn clean_number_text(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '"' | '\'' | ' ')).collect()
}

fn is_signed_digits(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn infer_int(value: &Value) -> Result<Value, String> {
    match value {
        Value::Int(_) => Ok(value.clone()),
        Value::Bool(_) => Err("booleans are not integers".to_string()),
        Value::Float(f) => {
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
            if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Ok(Value::Int(*f as i64))
            } else {
                Err("float has a fractional part".to_string())
            }
        }
        Value::Str(s) => {
            let cleaned = clean_number_text(s);
            if !is_signed_digits(&cleaned) {
                return Err("not an integer".to_string());
            }
            cleaned.parse::<i64>().map(Value::Int).map_err(|e| e.to_string())
        }
        _ => Err("not an integer".to_string()),
    }
}

pub(crate) fn infer_float(value: &Value) -> Result<Value, String> {
    match value {
        Value::Float(_) => Ok(value.clone()),
        Value::Int(_) => Err("integers are inferred as int".to_string()),
        Value::Bool(_) => Err("booleans are not floats".to_string()),
        Value::Str(s) => parse_float_text(s).map(Value::Float),
        _ => Err("not a number".to_string()),
    }
}

pub(crate) fn infer_bool(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Str(s) => {
            let t = s.trim();
            if t.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if t.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err("expected true or false".to_string())
            }
        }
        _ => Err("only text and booleans infer as bool".to_string()),
    }
}

/// Parse number text that may use `.` or `,` as decimal mark and the other as digit grouping.
///
/// When both marks appear, the right-most one is the decimal mark. A single mark on its own is
/// a decimal mark; a repeated mark on its own is digit grouping. Scientific notation with one
/// `e`/`E` is accepted. Plain decimal input must survive a render of the parsed value
/// (ignoring leading and trailing zeros), which rejects inputs with more precision than an
/// `f64` holds.
pub fn parse_float_text(s: &str) -> Result<f64, String> {
    let cleaned = clean_number_text(s);
    if cleaned.is_empty() {
        return Err("empty".to_string());
    }

    let exponents = cleaned.chars().filter(|c| matches!(c, 'e' | 'E')).count();
    if exponents > 1 {
        return Err("more than one exponent marker".to_string());
    }
    let (mantissa, exponent) = match cleaned.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (cleaned.as_str(), None),
    };

    let mantissa = normalize_decimal_marks(mantissa)?;
    if !is_plain_decimal(&mantissa) {
        return Err("not a number".to_string());
    }

    let normalized = match exponent {
        Some(e) => {
            if !is_signed_digits(e) {
                return Err("malformed exponent".to_string());
            }
            format!("{mantissa}e{e}")
        }
        None => mantissa.clone(),
    };

    let parsed = normalized.parse::<f64>().map_err(|e| e.to_string())?;
    if !parsed.is_finite() {
        return Err("out of range".to_string());
    }

    if exponent.is_none() && canonical_decimal(&mantissa) != canonical_decimal(&parsed.to_string()) {
        return Err(format!("'{mantissa}' does not survive conversion to float ({parsed})"));
    }
    Ok(parsed)
}

fn normalize_decimal_marks(s: &str) -> Result<String, String> {
    let dots = s.matches('.').count();
    let commas = s.matches(',').count();

    let out = match (dots, commas) {
        (0, 0) => s.to_string(),
        (1, 0) => s.to_string(),
        (_, 0) => s.replace('.', ""),
        (0, 1) => s.replace(',', "."),
        (0, _) => s.replace(',', ""),
        _ => {
            let last_dot = s.rfind('.').unwrap_or(0);
            let last_comma = s.rfind(',').unwrap_or(0);
            if last_dot > last_comma {
                if dots > 1 {
                    return Err("more than one decimal mark".to_string());
                }
                s.replace(',', "")
            } else {
                if commas > 1 {
                    return Err("more than one decimal mark".to_string());
                }
                s.replace('.', "").replace(',', ".")
            }
        }
    };
    Ok(out)
}

/// Optional sign, digits, optional single `.` with digits; at least one digit overall.
fn is_plain_decimal(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    (!int.is_empty() || !frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

fn canonical_decimal(s: &str) -> String {
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.strip_prefix('+').unwrap_or(s)),
    };
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    let int = int.trim_start_matches('0');
    let int = if int.is_empty() { "0" } else { int };
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{sign}{int}")
    } else {
        format!("{sign}{int}.{frac}")
    }
}
