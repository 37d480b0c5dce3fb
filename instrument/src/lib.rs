//! Collects `tracing` events into column tables, one table per event target.
//!
//! This is the in-process event log for dispatch runs: the core emits
//! `tracing::info!(target: "outcome", ...)` once per processed request and
//! this subscriber turns those events into rows. Columns appear the first
//! time a field is seen; rows that lack a field get a default value.
//!
//! # Usage
//!
//! ```ignore
//! let recorder = instrument::record(|| {
//!     engine.allocate(request);
//! });
//! let outcomes = &recorder.tables["outcome"];
//! assert_eq!(outcomes.row_count, 1);
//! ```
//!
//! Storage is thread-local: only events raised on the recording thread land
//! in its tables.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Level, Metadata, Subscriber};

/// A column of typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

/// One field value from one event.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

impl TypedColumn {
    /// Column for `cell`'s type, pre-filled with `rows` defaults.
    fn for_cell(cell: &Cell, rows: usize) -> Self {
        match cell {
            Cell::U64(_) => TypedColumn::U64(vec![0; rows]),
            Cell::I64(_) => TypedColumn::I64(vec![0; rows]),
            Cell::F64(_) => TypedColumn::F64(vec![0.0; rows]),
            Cell::Bool(_) => TypedColumn::Bool(vec![false; rows]),
            Cell::Str(_) => TypedColumn::Str(vec![String::new(); rows]),
        }
    }

    /// Append `cell`. A value whose type differs from the column's is
    /// stored as its string form when the column holds strings, and dropped
    /// otherwise (the row is padded instead).
    fn push(&mut self, cell: Cell) {
        match (self, cell) {
            (TypedColumn::U64(v), Cell::U64(x)) => v.push(x),
            (TypedColumn::I64(v), Cell::I64(x)) => v.push(x),
            (TypedColumn::F64(v), Cell::F64(x)) => v.push(x),
            (TypedColumn::Bool(v), Cell::Bool(x)) => v.push(x),
            (TypedColumn::Str(v), Cell::Str(x)) => v.push(x),
            (TypedColumn::Str(v), other) => v.push(other.to_string()),
            _ => {}
        }
    }

    fn pad_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        match self {
            TypedColumn::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            TypedColumn::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            TypedColumn::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedColumn::U64(v) => v.len(),
            TypedColumn::I64(v) => v.len(),
            TypedColumn::F64(v) => v.len(),
            TypedColumn::Bool(v) => v.len(),
            TypedColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn json_at(&self, row: usize) -> Value {
        match self {
            TypedColumn::U64(v) => v.get(row).map_or(Value::Null, |x| Value::from(*x)),
            TypedColumn::I64(v) => v.get(row).map_or(Value::Null, |x| Value::from(*x)),
            TypedColumn::F64(v) => v.get(row).map_or(Value::Null, |x| Value::from(*x)),
            TypedColumn::Bool(v) => v.get(row).map_or(Value::Null, |x| Value::from(*x)),
            TypedColumn::Str(v) => v.get(row).map_or(Value::Null, |x| Value::from(x.as_str())),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::U64(x) => write!(f, "{}", x),
            Cell::I64(x) => write!(f, "{}", x),
            Cell::F64(x) => write!(f, "{}", x),
            Cell::Bool(x) => write!(f, "{}", x),
            Cell::Str(x) => f.write_str(x),
        }
    }
}

/// Rows of one event target, stored column-wise.
#[derive(Debug, Clone, Default)]
pub struct DynamicTable {
    pub columns: HashMap<String, TypedColumn>,
    pub row_count: usize,
}

impl DynamicTable {
    fn push_row(&mut self, cells: Vec<(String, Cell)>) {
        let rows = self.row_count;
        for (name, cell) in cells {
            self.columns
                .entry(name)
                .or_insert_with(|| TypedColumn::for_cell(&cell, rows))
                .push(cell);
        }
        self.row_count += 1;
        for col in self.columns.values_mut() {
            col.pad_to(self.row_count);
        }
    }

    pub fn u64_column(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            TypedColumn::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn str_column(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            TypedColumn::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Number of rows whose string column `name` equals `value`.
    pub fn count_where(&self, name: &str, value: &str) -> usize {
        self.str_column(name)
            .map_or(0, |col| col.iter().filter(|v| *v == value).count())
    }

    /// Row-wise JSON objects, for handing to an external log sink.
    pub fn rows_json(&self) -> Vec<Value> {
        (0..self.row_count)
            .map(|row| {
                let mut obj = Map::new();
                for (name, col) in &self.columns {
                    obj.insert(name.clone(), col.json_at(row));
                }
                Value::Object(obj)
            })
            .collect()
    }
}

/// Collection of tables, keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub tables: HashMap<String, DynamicTable>,
}

impl Recorder {
    pub fn table(&self, target: &str) -> Option<&DynamicTable> {
        self.tables.get(target)
    }

    /// Row count for `target`, zero when nothing was recorded.
    pub fn rows(&self, target: &str) -> usize {
        self.table(target).map_or(0, |t| t.row_count)
    }
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

#[derive(Default)]
struct CellVisitor {
    cells: Vec<(String, Cell)>,
}

impl CellVisitor {
    fn put(&mut self, field: &Field, cell: Cell) {
        self.cells.push((field.name().to_string(), cell));
    }
}

impl Visit for CellVisitor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Cell::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Cell::I64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Cell::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Cell::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Cell::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Cell::Str(format!("{:?}", value)));
    }
}

/// Subscriber that appends every INFO-or-higher event to its target's table.
pub struct TableSubscriber;

impl Subscriber for TableSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = CellVisitor::default();
        event.record(&mut visitor);
        let target = event.metadata().target().to_string();

        RECORDER.with(|r| {
            r.borrow_mut()
                .tables
                .entry(target)
                .or_default()
                .push_row(visitor.cells);
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Take everything recorded on this thread.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

/// Run `f` with the subscriber scoped to this thread and return what it logged.
pub fn record<F: FnOnce()>(f: F) -> Recorder {
    clear();
    tracing::subscriber::with_default(TableSubscriber, f);
    drain()
}
