//! End-to-end tests for the evaluation driver
//!
//! A small `extern "C"` evaluator stands in for the interpreter. It
//! recognizes a handful of expressions and emits the cells a real
//! interpreter would, through the same C callback path.

use std::ffi::{CStr, CString, c_char};

use evalbridge_core::{
    CellCallback, CellError, ForeignFn, Rational64, Tag, TaggedCell, Value, evaluate,
    evaluate_values,
};

fn emit(callback: CellCallback, cell: TaggedCell) {
    unsafe { callback(&cell) };
}

unsafe extern "C" fn mock_scheme(expr: *const c_char, callback: CellCallback) {
    let expr = unsafe { CStr::from_ptr(expr) }.to_str().unwrap_or("");
    match expr {
        "(values 3 4)" => {
            emit(callback, TaggedCell::integer(3));
            emit(callback, TaggedCell::integer(4));
        }
        "(vector 1 2)" => {
            emit(callback, TaggedCell::marker(Tag::VectorStart));
            emit(callback, TaggedCell::integer(1));
            emit(callback, TaggedCell::integer(2));
            emit(callback, TaggedCell::marker(Tag::VectorEnd));
        }
        "(vector 1 (vector 2 #t) '())" => {
            emit(callback, TaggedCell::marker(Tag::VectorStart));
            emit(callback, TaggedCell::integer(1));
            emit(callback, TaggedCell::marker(Tag::VectorStart));
            emit(callback, TaggedCell::integer(2));
            emit(callback, TaggedCell::boolean(true));
            emit(callback, TaggedCell::marker(Tag::VectorEnd));
            emit(callback, TaggedCell::nil());
            emit(callback, TaggedCell::marker(Tag::VectorEnd));
        }
        "(/ 1 3)" => emit(callback, TaggedCell::rational(1, 3)),
        "(make-rectangular 1.5 -2)" => emit(callback, TaggedCell::complex(1.5, -2.0)),
        "(exact->inexact 1/4)" => emit(callback, TaggedCell::double(0.25)),
        "(values \"hi\" 'sym :kw)" => {
            // Buffers are freed and overwritten as soon as each callback returns
            for (tag, text) in [(Tag::String, "hi"), (Tag::Symbol, "sym"), (Tag::Keyword, "kw")] {
                let owned = CString::new(text).unwrap();
                let mut bytes = owned.into_bytes_with_nul();
                let mut cell = TaggedCell::marker(tag);
                cell.content.string = bytes.as_ptr() as *const c_char;
                emit(callback, cell);
                bytes.iter_mut().for_each(|b| *b = b'X');
                drop(bytes);
            }
        }
        "(if #f #f)" => emit(callback, TaggedCell::marker(Tag::Void)),
        "(weird)" => {
            emit(callback, TaggedCell::integer(1));
            emit(callback, TaggedCell::with_raw_tag(99));
            emit(callback, TaggedCell::marker(Tag::Unknown));
            emit(callback, TaggedCell::integer(2));
        }
        "(broken-close)" => {
            emit(callback, TaggedCell::marker(Tag::VectorEnd));
            emit(callback, TaggedCell::integer(5));
        }
        "(bool-encodings)" => {
            emit(callback, TaggedCell::raw_bool(1));
            emit(callback, TaggedCell::raw_bool(0));
            emit(callback, TaggedCell::raw_bool(7));
        }
        _ => {}
    }
}

fn scheme() -> ForeignFn {
    unsafe { ForeignFn::new(mock_scheme) }
}

#[test]
fn test_multiple_values_become_sequence() {
    let values = evaluate_values(&scheme(), "(values 3 4)").unwrap();
    assert_eq!(values, vec![Value::Int(3), Value::Int(4)]);
}

#[test]
fn test_vector_is_one_value() {
    let eval = evaluate(&scheme(), "(vector 1 2)").unwrap();
    assert!(eval.is_clean());
    assert_eq!(eval.values(), &[Value::Vector(vec![Value::Int(1), Value::Int(2)])]);
}

#[test]
fn test_nested_vectors() {
    let values = evaluate_values(&scheme(), "(vector 1 (vector 2 #t) '())").unwrap();
    assert_eq!(
        values,
        vec![Value::Vector(vec![
            Value::Int(1),
            Value::Vector(vec![Value::Int(2), Value::Bool(true)]),
            Value::Nil,
        ])]
    );
}

#[test]
fn test_rational_is_exact_one_third() {
    let values = evaluate_values(&scheme(), "(/ 1 3)").unwrap();
    let Value::Rational(r) = &values[0] else {
        panic!("expected rational, got {:?}", values[0]);
    };
    assert_eq!(*r, Rational64::new(1, 3));
    assert_eq!(*r + *r + *r, Rational64::from_integer(1));
}

#[test]
fn test_complex_and_double() {
    assert_eq!(
        evaluate_values(&scheme(), "(make-rectangular 1.5 -2)").unwrap(),
        vec![Value::complex(1.5, -2.0)]
    );
    assert_eq!(
        evaluate_values(&scheme(), "(exact->inexact 1/4)").unwrap(),
        vec![Value::Double(0.25)]
    );
}

#[test]
fn test_strings_are_copied_on_receipt() {
    let values = evaluate_values(&scheme(), "(values \"hi\" 'sym :kw)").unwrap();
    assert_eq!(
        values,
        vec![Value::from("hi"), Value::symbol("sym"), Value::keyword("kw")]
    );
}

#[test]
fn test_void_yields_no_values() {
    let eval = evaluate(&scheme(), "(if #f #f)").unwrap();
    assert!(eval.is_empty());
    assert!(eval.is_clean());
}

#[test]
fn test_unknown_tags_never_appear() {
    let eval = evaluate(&scheme(), "(weird)").unwrap();
    assert_eq!(eval.values(), &[Value::Int(1), Value::Int(2)]);
    assert_eq!(
        eval.errors(),
        &[CellError::UnknownTag(99), CellError::UnknownTag(-2)]
    );
}

#[test]
fn test_unmatched_close_is_reported_not_fatal() {
    let eval = evaluate(&scheme(), "(broken-close)").unwrap();
    assert_eq!(eval.values(), &[Value::Int(5)]);
    assert_eq!(eval.errors(), &[CellError::UnmatchedVectorEnd]);
}

#[test]
fn test_bool_is_true_only_for_one() {
    assert_eq!(
        evaluate_values(&scheme(), "(bool-encodings)").unwrap(),
        vec![Value::Bool(true), Value::Bool(false), Value::Bool(false)]
    );
}

#[test]
fn test_leaf_count_matches_value_count() {
    // Without vectors, every leaf cell except void/unknown becomes one value
    let eval = evaluate(&scheme(), "(values \"hi\" 'sym :kw)").unwrap();
    assert_eq!(eval.len(), 3);
}

#[test]
fn test_unrecognized_expression_yields_nothing() {
    let eval = evaluate(&scheme(), "(undefined-thing)").unwrap();
    assert!(eval.is_empty());
    assert!(eval.is_clean());
}

#[test]
fn test_concurrent_evaluations_do_not_interfere() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                for _ in 0..50 {
                    let values = evaluate_values(&scheme(), "(values 3 4)").unwrap();
                    assert_eq!(values, vec![Value::Int(3), Value::Int(4)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
