//! Scheme-style printing of host values
//!
//! Renders a [`Value`] the way a Scheme REPL would echo it back, so results
//! can be shown to users or fed to the interpreter again.
//!
//! # Format Examples
//!
//! - Nil: `()`
//! - Bool: `#t` / `#f`
//! - Int: `42`
//! - Double: `3.14`, `2.0`, `+inf.0`, `+nan.0`
//! - Rational: `1/3`
//! - Complex: `1.0+2.0i`
//! - String: `"hello"` (with escaping)
//! - Symbol: `foo`
//! - Keyword: `:verbose`
//! - Vector: `#(1 2 3)`

use std::fmt;

use crate::value::Value;

/// Configuration for printed output
#[derive(Debug, Clone)]
pub struct PrintConfig {
    /// Put each element of a nested vector on its own indented line
    pub pretty: bool,
    /// Number of spaces per indentation level
    pub indent: usize,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: 2,
        }
    }
}

impl PrintConfig {
    /// Single-line output
    pub fn compact() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self {
            pretty: true,
            indent: 2,
        }
    }
}

/// Format a Value as Scheme source text
pub fn value_to_scheme(value: &Value, config: &PrintConfig) -> String {
    let mut buf = String::new();
    format_value(value, config, 0, &mut buf);
    buf
}

fn format_value(value: &Value, config: &PrintConfig, depth: usize, buf: &mut String) {
    match value {
        Value::Nil => buf.push_str("()"),
        Value::Bool(b) => buf.push_str(if *b { "#t" } else { "#f" }),
        Value::Int(n) => buf.push_str(&n.to_string()),
        Value::Double(d) => format_double(*d, buf),
        Value::Rational(r) => {
            buf.push_str(&r.numer().to_string());
            if *r.denom() != 1 {
                buf.push('/');
                buf.push_str(&r.denom().to_string());
            }
        }
        Value::Complex(c) => {
            format_double(c.re, buf);
            // Imaginary part always carries its sign
            if !c.im.is_sign_negative() && !c.im.is_nan() && c.im.is_finite() {
                buf.push('+');
            }
            format_double(c.im, buf);
            buf.push('i');
        }
        Value::String(s) => format_string(s, buf),
        Value::Symbol(sym) => buf.push_str(&sym.name),
        Value::Keyword(kw) => {
            buf.push(':');
            buf.push_str(&kw.name);
        }
        Value::Vector(items) => format_vector(items, config, depth, buf),
    }
}

fn format_double(d: f64, buf: &mut String) {
    if d.is_nan() {
        buf.push_str("+nan.0");
    } else if d.is_infinite() {
        buf.push_str(if d > 0.0 { "+inf.0" } else { "-inf.0" });
    } else {
        let s = d.to_string();
        buf.push_str(&s);
        // Keep doubles distinguishable from integers
        if !s.contains('.') && !s.contains('e') {
            buf.push_str(".0");
        }
    }
}

/// Format a string with escaping
fn format_string(s: &str, buf: &mut String) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if c.is_control() => {
                buf.push_str(&format!("\\x{:x};", c as u32));
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}

fn format_vector(items: &[Value], config: &PrintConfig, depth: usize, buf: &mut String) {
    buf.push_str("#(");
    let nested = items.iter().any(|v| matches!(v, Value::Vector(_)));

    if config.pretty && nested {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                buf.push('\n');
                push_indent(buf, depth + 1, config.indent);
            }
            format_value(item, config, depth + 1, buf);
        }
    } else {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                buf.push(' ');
            }
            format_value(item, config, depth, buf);
        }
    }
    buf.push(')');
}

/// Push indentation spaces
fn push_indent(buf: &mut String, depth: usize, indent_size: usize) {
    for _ in 0..(depth * indent_size) {
        buf.push(' ');
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&value_to_scheme(self, &PrintConfig::compact()))
    }
}
