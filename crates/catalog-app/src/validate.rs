use garde::Report;
use serde::Serialize;

/// Error bound to a form field, as displayed next to the input
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Form with fields listed in the order they are displayed
pub trait FormFields {
    const FIELDS: &'static [&'static str];
}

fn field_position(fields: &[&str], path: &str) -> usize {
    let name = path.split(['.', '[']).next().unwrap_or(path);
    fields
        .iter()
        .position(|f| *f == name)
        .unwrap_or(fields.len())
}

/// All errors from report, in order of form fields
///
/// Report itself is ordered by path, so errors are re-sorted, keeping order of errors for the same field.
pub fn field_errors<F: FormFields>(report: &Report) -> Vec<FieldError> {
    let mut errors: Vec<FieldError> = report
        .iter()
        .map(|(path, error)| FieldError::new(path.to_string(), error.message()))
        .collect();
    errors.sort_by_key(|e| field_position(F::FIELDS, &e.field));
    errors
}

/// Replaces characters significant in HTML markup with entities
pub fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Trim and escape
pub fn sanitize(input: &str) -> String {
    escape(input.trim())
}

pub(crate) fn required(value: &str, message: &'static str) -> garde::Result {
    if value.is_empty() {
        Err(garde::Error::new(message))
    } else {
        Ok(())
    }
}

pub(crate) fn parse_price(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

pub(crate) fn parse_stock(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().filter(|s| *s >= 0)
}
