use serde_json::Value;

/// One statistic value as it arrives from the stats feed, after numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Flag(bool),
    Null,
    Other(Value),
}

impl StatValue {
    /// Strings that parse as floats become numbers; anything else keeps its shape.
    pub fn coerce(value: Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => StatValue::Integer(i),
                None => StatValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(f) => StatValue::Number(f),
                Err(_) => StatValue::Text(s),
            },
            Value::Bool(b) => StatValue::Flag(b),
            Value::Null => StatValue::Null,
            other => StatValue::Other(other),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, StatValue::Integer(_) | StatValue::Number(_))
    }

    /// NaN counts as missing, same as an explicit null.
    pub fn is_missing(&self) -> bool {
        match self {
            StatValue::Null => true,
            StatValue::Number(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn render(&self) -> String {
        match self {
            StatValue::Integer(i) => i.to_string(),
            StatValue::Number(f) => render_float(*f),
            StatValue::Text(s) => s.clone(),
            StatValue::Flag(true) => "True".to_string(),
            StatValue::Flag(false) => "False".to_string(),
            StatValue::Null => String::new(),
            StatValue::Other(v) => v.to_string(),
        }
    }

    /// Rendering for a number column that holds floats or has gaps: integers print as `30.0`.
    pub fn render_as_float(&self) -> String {
        match self {
            StatValue::Integer(i) => render_float(*i as f64),
            other => other.render(),
        }
    }
}

fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}
