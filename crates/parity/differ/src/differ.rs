use parity_types::{join_path, CanonicalRecord, Difference, Record, Scalar, ToleranceSpec, Value};
use tracing::debug;

/// Lock-step walker over two canonical trees.
///
/// Pure: the same inputs always yield the same differences, in key order.
pub struct Differ<'a> {
    tolerance: &'a ToleranceSpec,
    path: Vec<String>,
    out: Vec<Difference>,
}

impl<'a> Differ<'a> {
    pub fn new(tolerance: &'a ToleranceSpec) -> Self {
        Self {
            tolerance,
            path: Vec::new(),
            out: Vec::new(),
        }
    }

    /// Compare two records' fields.
    pub fn diff(mut self, a: &CanonicalRecord, b: &CanonicalRecord) -> Vec<Difference> {
        self.records(a.fields(), b.fields());
        debug!(
            root = %a.root(),
            differences = self.out.len(),
            "compared canonical records"
        );
        self.out
    }

    /// Compare two values rooted at `path`.
    pub fn diff_values(mut self, path: &[&str], a: &Value, b: &Value) -> Vec<Difference> {
        self.path = path.iter().map(|s| s.to_string()).collect();
        self.values(a, b);
        self.out
    }

    fn current(&self) -> String {
        join_path(&self.path)
    }

    fn push_segment(&mut self, segment: String) {
        self.path.push(segment);
    }

    fn pop_segment(&mut self) {
        self.path.pop();
    }

    fn records(&mut self, a: &Record, b: &Record) {
        let mut left = a.iter().peekable();
        let mut right = b.iter().peekable();
        loop {
            match (left.peek(), right.peek()) {
                (Some((ka, va)), Some((kb, vb))) => match ka.cmp(kb) {
                    std::cmp::Ordering::Equal => {
                        self.push_segment(ka.to_string());
                        self.values(va, vb);
                        self.pop_segment();
                        left.next();
                        right.next();
                    }
                    std::cmp::Ordering::Less => {
                        self.removed(ka, va);
                        left.next();
                    }
                    std::cmp::Ordering::Greater => {
                        self.added(kb, vb);
                        right.next();
                    }
                },
                (Some((ka, va)), None) => {
                    self.removed(ka, va);
                    left.next();
                }
                (None, Some((kb, vb))) => {
                    self.added(kb, vb);
                    right.next();
                }
                (None, None) => break,
            }
        }
    }

    fn removed(&mut self, key: &str, old: &Value) {
        self.push_segment(key.to_string());
        let path = self.current();
        self.out.push(Difference::Removed {
            path,
            old: old.clone(),
        });
        self.pop_segment();
    }

    fn added(&mut self, key: &str, new: &Value) {
        self.push_segment(key.to_string());
        let path = self.current();
        self.out.push(Difference::Added {
            path,
            new: new.clone(),
        });
        self.pop_segment();
    }

    fn lists(&mut self, a: &[Value], b: &[Value]) {
        for (index, (va, vb)) in a.iter().zip(b).enumerate() {
            self.push_segment(index.to_string());
            self.values(va, vb);
            self.pop_segment();
        }
        for (index, old) in a.iter().enumerate().skip(b.len()) {
            self.removed(&index.to_string(), old);
        }
        for (index, new) in b.iter().enumerate().skip(a.len()) {
            self.added(&index.to_string(), new);
        }
    }

    fn scalars(&mut self, a: &Scalar, b: &Scalar) {
        match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => {
                if !self.tolerance.within(&self.path, x, y) {
                    let path = self.current();
                    self.out
                        .push(Difference::value_changed(path, a.clone().into(), b.clone().into()));
                }
            }
            (None, None) if a.kind() == b.kind() => {
                if a != b {
                    let path = self.current();
                    self.out
                        .push(Difference::value_changed(path, a.clone().into(), b.clone().into()));
                }
            }
            _ => {
                let path = self.current();
                self.out
                    .push(Difference::type_changed(path, a.clone().into(), b.clone().into()));
            }
        }
    }

    fn values(&mut self, a: &Value, b: &Value) {
        match (a, b) {
            (Value::Scalar(x), Value::Scalar(y)) => self.scalars(x, y),
            (Value::List(x), Value::List(y)) => self.lists(x, y),
            (Value::Record(x), Value::Record(y)) => self.records(x, y),
            _ => {
                let path = self.current();
                self.out
                    .push(Difference::type_changed(path, a.clone(), b.clone()));
            }
        }
    }
}

/// Every structural difference between `a` and `b`.
pub fn diff(a: &CanonicalRecord, b: &CanonicalRecord, tolerance: &ToleranceSpec) -> Vec<Difference> {
    Differ::new(tolerance).diff(a, b)
}

/// Whether two records have no differences at all.
pub fn is_identical(a: &CanonicalRecord, b: &CanonicalRecord, tolerance: &ToleranceSpec) -> bool {
    diff(a, b, tolerance).is_empty()
}
