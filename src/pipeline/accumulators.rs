//! Group accumulators
//!
//! Each accumulator owns its running state. The group stage creates one
//! boxed accumulator per (group key, output field), feeds it every document
//! of the group and finalizes it once the input is exhausted.
//!
//! Operators are looked up in an [`AccumulatorRegistry`] while the pipeline
//! is parsed, so an unknown operator never reaches execution.

use std::collections::BTreeMap;
use std::fmt;

use crate::value::Value;

/// Running state of one accumulator operator.
///
/// `accumulate` receives `None` when the source field is absent from the
/// document.
pub trait Accumulator: fmt::Debug {
    fn accumulate(&mut self, value: Option<&Value>);

    fn finalize(self: Box<Self>) -> Value;
}

/// Creates a fresh accumulator in its initial state
pub type AccumulatorFactory = fn() -> Box<dyn Accumulator>;

/// Name to factory table of accumulator operators
#[derive(Clone)]
pub struct AccumulatorRegistry {
    factories: BTreeMap<String, AccumulatorFactory>,
}

impl AccumulatorRegistry {
    /// Registry with no operators
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with all built-in operators
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("$sum", || Box::new(Sum::default()));
        registry.register("$avg", || Box::new(Avg::default()));
        registry.register("$min", || Box::new(Extreme::min()));
        registry.register("$max", || Box::new(Extreme::max()));
        registry.register("$push", || Box::new(Push::default()));
        registry.register("$addToSet", || Box::new(AddToSet::default()));
        registry.register("$first", || Box::new(First::default()));
        registry.register("$last", || Box::new(Last::default()));
        registry
    }

    /// Registers an operator, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, factory: AccumulatorFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn get(&self, name: &str) -> Option<AccumulatorFactory> {
        self.factories.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for AccumulatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for AccumulatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

// ============================================================================
// Numeric coercion
// ============================================================================

/// Numeric view of a value for `$sum` and `$avg`.
///
/// Bools count as 0/1 and numeric strings parse. Everything else is 0.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

fn coerce_number(value: &Value) -> Number {
    match value {
        Value::Int(i) => Number::Int(*i),
        Value::Float(f) => Number::Float(*f),
        Value::Bool(b) => Number::Int(i64::from(*b)),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Number::Int(i)
            } else if let Ok(f) = trimmed.parse::<f64>() {
                Number::Float(f)
            } else {
                Number::Int(0)
            }
        }
        _ => Number::Int(0),
    }
}

// ============================================================================
// Built-in operators
// ============================================================================

/// `$sum`: stays integral until a float arrives or the total overflows
#[derive(Debug)]
struct Sum {
    total: Number,
}

impl Default for Sum {
    fn default() -> Self {
        Self {
            total: Number::Int(0),
        }
    }
}

impl Accumulator for Sum {
    fn accumulate(&mut self, value: Option<&Value>) {
        let Some(value) = value else { return };
        self.total = match (self.total, coerce_number(value)) {
            (Number::Int(a), Number::Int(b)) => match a.checked_add(b) {
                Some(total) => Number::Int(total),
                None => Number::Float(a as f64 + b as f64),
            },
            (Number::Int(a), Number::Float(b)) => Number::Float(a as f64 + b),
            (Number::Float(a), Number::Int(b)) => Number::Float(a + b as f64),
            (Number::Float(a), Number::Float(b)) => Number::Float(a + b),
        };
    }

    fn finalize(self: Box<Self>) -> Value {
        match self.total {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// `$avg`: only present non-null values count
#[derive(Debug, Default)]
struct Avg {
    sum: f64,
    count: u64,
}

impl Accumulator for Avg {
    fn accumulate(&mut self, value: Option<&Value>) {
        match value {
            None | Some(Value::Null) => {}
            Some(value) => {
                self.sum += match coerce_number(value) {
                    Number::Int(i) => i as f64,
                    Number::Float(f) => f,
                };
                self.count += 1;
            }
        }
    }

    fn finalize(self: Box<Self>) -> Value {
        if self.count == 0 {
            Value::Int(0)
        } else {
            Value::Float(self.sum / self.count as f64)
        }
    }
}

/// `$min` and `$max`. `None` stands for the unbounded starting extreme.
#[derive(Debug)]
struct Extreme {
    current: Option<Value>,
    keep_greater: bool,
}

impl Extreme {
    fn min() -> Self {
        Self {
            current: None,
            keep_greater: false,
        }
    }

    fn max() -> Self {
        Self {
            current: None,
            keep_greater: true,
        }
    }
}

impl Accumulator for Extreme {
    fn accumulate(&mut self, value: Option<&Value>) {
        let value = match value {
            None | Some(Value::Null) => return,
            Some(value) => value,
        };
        let replace = match &self.current {
            None => true,
            Some(current) if self.keep_greater => value > current,
            Some(current) => value < current,
        };
        if replace {
            self.current = Some(value.clone());
        }
    }

    fn finalize(self: Box<Self>) -> Value {
        self.current.unwrap_or(Value::Null)
    }
}

/// `$push`
#[derive(Debug, Default)]
struct Push {
    values: Vec<Value>,
}

impl Accumulator for Push {
    fn accumulate(&mut self, value: Option<&Value>) {
        self.values.push(value.cloned().unwrap_or(Value::Null));
    }

    fn finalize(self: Box<Self>) -> Value {
        Value::Array(self.values)
    }
}

/// `$addToSet`: first-seen order, uniqueness by value equality
#[derive(Debug, Default)]
struct AddToSet {
    values: Vec<Value>,
}

impl Accumulator for AddToSet {
    fn accumulate(&mut self, value: Option<&Value>) {
        let value = value.cloned().unwrap_or(Value::Null);
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }

    fn finalize(self: Box<Self>) -> Value {
        Value::Array(self.values)
    }
}

#[derive(Debug, Default)]
struct First {
    value: Option<Value>,
}

impl Accumulator for First {
    fn accumulate(&mut self, value: Option<&Value>) {
        if self.value.is_none() {
            self.value = Some(value.cloned().unwrap_or(Value::Null));
        }
    }

    fn finalize(self: Box<Self>) -> Value {
        self.value.unwrap_or(Value::Null)
    }
}

#[derive(Debug, Default)]
struct Last {
    value: Option<Value>,
}

impl Accumulator for Last {
    fn accumulate(&mut self, value: Option<&Value>) {
        self.value = Some(value.cloned().unwrap_or(Value::Null));
    }

    fn finalize(self: Box<Self>) -> Value {
        self.value.unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str, inputs: &[Option<Value>]) -> Value {
        let factory = AccumulatorRegistry::with_builtins().get(name).unwrap();
        let mut acc = factory();
        for input in inputs {
            acc.accumulate(input.as_ref());
        }
        acc.finalize()
    }

    // ==================== Registry ====================

    #[test]
    fn test_builtins_registered() {
        let registry = AccumulatorRegistry::default();
        for name in ["$sum", "$avg", "$min", "$max", "$push", "$addToSet", "$first", "$last"] {
            assert!(registry.contains(name), "{} missing", name);
        }
        assert!(!registry.contains("$median"));
    }

    #[derive(Debug, Default)]
    struct CountNulls(i64);

    impl Accumulator for CountNulls {
        fn accumulate(&mut self, value: Option<&Value>) {
            if value.map_or(true, Value::is_null) {
                self.0 += 1;
            }
        }

        fn finalize(self: Box<Self>) -> Value {
            Value::Int(self.0)
        }
    }

    #[test]
    fn test_register_custom_operator() {
        let mut registry = AccumulatorRegistry::empty();
        registry.register("$countNulls", || Box::new(CountNulls::default()));

        let mut acc = registry.get("$countNulls").unwrap()();
        acc.accumulate(None);
        acc.accumulate(Some(&Value::Null));
        acc.accumulate(Some(&Value::Int(3)));
        assert_eq!(acc.finalize(), Value::Int(2));
    }

    // ==================== $sum ====================

    #[test]
    fn test_sum_ints_stays_int() {
        let result = run("$sum", &[Some(Value::Int(2)), Some(Value::Int(3))]);
        assert!(matches!(result, Value::Int(5)));
    }

    #[test]
    fn test_sum_switches_to_float() {
        let result = run("$sum", &[Some(Value::Int(1)), Some(Value::Float(0.5))]);
        assert!(matches!(result, Value::Float(f) if f == 1.5));
    }

    #[test]
    fn test_sum_coercion() {
        let result = run(
            "$sum",
            &[
                None,
                Some(Value::Null),
                Some(Value::Bool(true)),
                Some(Value::from("4")),
                Some(Value::from("abc")),
                Some(Value::Array(vec![Value::Int(9)])),
            ],
        );
        assert_eq!(result, Value::Int(5));
    }

    #[test]
    fn test_sum_overflow_becomes_float() {
        let result = run("$sum", &[Some(Value::Int(i64::MAX)), Some(Value::Int(1))]);
        assert!(matches!(result, Value::Float(_)));
    }

    #[test]
    fn test_sum_empty_is_zero() {
        assert!(matches!(run("$sum", &[]), Value::Int(0)));
    }

    // ==================== $avg ====================

    #[test]
    fn test_avg_ignores_missing_and_null() {
        let result = run(
            "$avg",
            &[Some(Value::Int(2)), None, Some(Value::Null), Some(Value::Int(4))],
        );
        assert!(matches!(result, Value::Float(f) if f == 3.0));
    }

    #[test]
    fn test_avg_with_no_values_is_zero() {
        assert!(matches!(run("$avg", &[None, Some(Value::Null)]), Value::Int(0)));
    }

    // ==================== $min / $max ====================

    #[test]
    fn test_min_max() {
        let inputs = [
            Some(Value::Int(5)),
            None,
            Some(Value::Float(2.5)),
            Some(Value::Null),
            Some(Value::Int(9)),
        ];
        assert_eq!(run("$min", &inputs), Value::Float(2.5));
        assert_eq!(run("$max", &inputs), Value::Int(9));
    }

    #[test]
    fn test_min_max_cross_type_ordering() {
        let inputs = [Some(Value::from("a")), Some(Value::Int(100))];
        assert_eq!(run("$min", &inputs), Value::Int(100));
        assert_eq!(run("$max", &inputs), Value::from("a"));
    }

    #[test]
    fn test_untouched_extreme_is_null() {
        assert!(run("$min", &[None]).is_null());
        assert!(run("$max", &[]).is_null());
    }

    // ==================== $push / $addToSet ====================

    #[test]
    fn test_push_keeps_duplicates_and_missing() {
        let result = run("$push", &[Some(Value::Int(1)), None, Some(Value::Int(1))]);
        assert_eq!(
            result,
            Value::Array(vec![Value::Int(1), Value::Null, Value::Int(1)])
        );
    }

    #[test]
    fn test_add_to_set_first_seen_order() {
        let result = run(
            "$addToSet",
            &[
                Some(Value::from("b")),
                Some(Value::from("a")),
                Some(Value::from("b")),
                Some(Value::Int(1)),
                Some(Value::Float(1.0)),
            ],
        );
        assert_eq!(
            result,
            Value::Array(vec![Value::from("b"), Value::from("a"), Value::Int(1)])
        );
    }

    // ==================== $first / $last ====================

    #[test]
    fn test_first_and_last() {
        let inputs = [None, Some(Value::Int(2)), Some(Value::Int(3))];
        assert!(run("$first", &inputs).is_null());
        assert_eq!(run("$last", &inputs), Value::Int(3));
        assert!(run("$last", &[]).is_null());
    }
}
