use num_complex::Complex64;
use num_rational::Rational64;
use serde::Serialize;

/// Symbol: an identifier that is data, not code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Symbol {
    pub name: String,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol { name: name.into() }
    }
}

/// Keyword: a named flag (`:verbose`)
///
/// Kept distinct from [`Symbol`] even though both carry only a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Keyword {
    pub name: String,
}

impl Keyword {
    pub fn new(name: impl Into<String>) -> Self {
        Keyword { name: name.into() }
    }
}

/// Value: what the interpreter hands back, in host form
///
/// Every variant owns its data. Nothing here borrows from foreign memory,
/// so a Value outlives the evaluation call that produced it.
///
/// There is no void variant: a void result contributes no Value at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// The empty list
    Nil,

    Bool(bool),

    /// Integer (the foreign `long`, widened losslessly)
    Int(i64),

    /// Floating-point value (IEEE 754 double precision)
    Double(f64),

    /// Exact rational, normalized to lowest terms with a positive denominator
    Rational(Rational64),

    /// Complex number with f64 parts
    Complex(Complex64),

    String(String),

    Symbol(Symbol),

    Keyword(Keyword),

    /// Ordered sequence of values (a vector or list on the foreign side)
    Vector(Vec<Value>),
}

impl Value {
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(Symbol::new(name))
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Value::Keyword(Keyword::new(name))
    }

    pub fn rational(numerator: i64, denominator: i64) -> Self {
        Value::Rational(Rational64::new(numerator, denominator))
    }

    pub fn complex(real: f64, imag: f64) -> Self {
        Value::Complex(Complex64::new(real, imag))
    }

    /// Name of the variant, as used in diagnostics and JSON output
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Rational(_) => "rational",
            Value::Complex(_) => "complex",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Keyword(_) => "keyword",
            Value::Vector(_) => "vector",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// String contents. Symbols and keywords are not strings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Rational64> for Value {
    fn from(r: Rational64) -> Self {
        Value::Rational(r)
    }
}

impl From<Complex64> for Value {
    fn from(c: Complex64) -> Self {
        Value::Complex(c)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Vector(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_and_keyword_are_distinct() {
        assert_ne!(Value::symbol("foo"), Value::keyword("foo"));
        assert_eq!(Value::symbol("foo").type_name(), "symbol");
        assert_eq!(Value::keyword("foo").type_name(), "keyword");
    }

    #[test]
    fn test_symbol_is_not_a_string() {
        assert_eq!(Value::symbol("foo").as_str(), None);
        assert_eq!(Value::from("foo").as_str(), Some("foo"));
    }

    #[test]
    fn test_rational_normalizes() {
        assert_eq!(Value::rational(2, 6), Value::rational(1, 3));
        assert_eq!(Value::rational(1, -2), Value::rational(-1, 2));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(Value::Vector(vec![
            Value::Int(1),
            Value::keyword("k"),
            Value::Nil,
        ]))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "vector",
                "value": [
                    {"type": "int", "value": 1},
                    {"type": "keyword", "value": {"name": "k"}},
                    {"type": "nil"}
                ]
            })
        );
    }

    #[test]
    fn test_rational_json_is_exact() {
        let json = serde_json::to_value(Value::rational(1, 3)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "rational", "value": [1, 3]}));
    }
}
