//! Total equality, ordering and hashing for [`Value`]
//!
//! Tier order: `Null < Bool < Number < String < Array < Document`.
//! Within a tier values compare naturally. Integers and floats compare by
//! numeric value without going through a lossy cast. NaN sorts below every
//! other number and is equal to itself.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use super::{Document, Value};

// 2^63, the first f64 beyond the i64 range
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Value {
    /// Rank of the value's type in the cross-type order
    fn tier(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Document(_) => 5,
        }
    }
}

fn cmp_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return Ordering::Greater;
    }
    if f >= I64_UPPER_BOUND {
        return Ordering::Less;
    }
    if f < -I64_UPPER_BOUND {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => cmp_floats(0.0, f - whole),
        other => other,
    }
}

fn cmp_documents(a: &Document, b: &Document) -> Ordering {
    let left = a.sorted_entries();
    let right = b.sorted_entries();
    for ((ka, va), (kb, vb)) in left.iter().zip(right.iter()) {
        let ordering = ka.cmp(kb).then_with(|| va.cmp(vb));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let tiers = self.tier().cmp(&other.tier());
        if tiers != Ordering::Equal {
            return tiers;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => cmp_floats(*a, *b),
            (Value::Int(a), Value::Float(b)) => cmp_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => cmp_documents(a, b),
            // Tiers are equal, so the remaining pairs cannot occur
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

fn hash_float<H: Hasher>(f: f64, state: &mut H) {
    if f.is_nan() {
        state.write_u64(f64::NAN.to_bits());
    } else if f.fract() == 0.0 && (-I64_UPPER_BOUND..I64_UPPER_BOUND).contains(&f) {
        // Integral floats hash like the equal integer
        state.write_i64(f as i64);
    } else {
        state.write_u64(f.to_bits());
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.tier());
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => state.write_i64(*i),
            Value::Float(f) => hash_float(*f, state),
            Value::String(s) => s.hash(state),
            Value::Array(items) => items.hash(state),
            Value::Document(doc) => doc.hash(state),
        }
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_documents(self, other)
    }
}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Documents are equal when they hold the same fields with equal values,
/// regardless of field order.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && cmp_documents(self, other) == Ordering::Equal
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for (key, value) in self.sorted_entries() {
            key.hash(state);
            value.hash(state);
        }
    }
}
