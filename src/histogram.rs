use std::sync::Arc;

use itertools::{Itertools, MinMaxResult};
use log::info;

use crate::database::Database;
use crate::error::DbResult;
use crate::field::{Field, FieldType, Op, TupleDesc};
use crate::ids::{TableId, TransactionId};

/// Cost, in arbitrary units, charged per page read during a full scan.
/// Used only to rank plans against each other, not as a wall-clock estimate.
pub const IO_COST_PER_PAGE: f64 = 1000.0;

/// An equi-width histogram over an integer column, used to estimate the
/// selectivity of a comparison against that column without scanning the
/// table.
#[derive(Debug, Clone)]
pub struct IntHistogram {
    min: i32,
    max: i32,
    buckets: Vec<u32>,
    width: i64,
    total: u64,
}

impl IntHistogram {
    pub fn new(num_buckets: usize, min: i32, max: i32) -> IntHistogram {
        let width = ((max as i64 - min as i64 + 1) + num_buckets as i64 - 1) / num_buckets as i64;
        IntHistogram {
            min,
            max,
            buckets: vec![0; num_buckets],
            width: width.max(1),
            total: 0,
        }
    }

    fn bucket_of(&self, v: i32) -> usize {
        let b = (v as i64 - self.min as i64) / self.width;
        b.clamp(0, self.buckets.len() as i64 - 1) as usize
    }

    /// Effective width of `bucket`: every bucket but the last is `width`
    /// wide; the last absorbs whatever remains of the value range.
    fn bucket_width(&self, bucket: usize) -> f64 {
        if bucket + 1 == self.buckets.len() {
            (self.max as i64 - self.min as i64 - (self.buckets.len() as i64 - 1) * self.width + 1)
                as f64
        } else {
            self.width as f64
        }
    }

    fn right_edge(&self, bucket: usize) -> i64 {
        self.min as i64 + (bucket as i64 + 1) * self.width
    }

    pub fn add_value(&mut self, v: i32) {
        let b = self.bucket_of(v);
        self.buckets[b] += 1;
        self.total += 1;
    }

    /// Fraction of values expected to satisfy `field <op> v`.
    pub fn estimate_selectivity(&self, op: Op, v: i32) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        let total = self.total as f64;

        let eq = if v < self.min || v > self.max {
            0.0
        } else {
            let b = self.bucket_of(v);
            self.buckets[b] as f64 / self.bucket_width(b) / total
        };

        let gt = if v < self.min {
            total
        } else if v > self.max {
            0.0
        } else {
            let b = self.bucket_of(v);
            let above: u32 = self.buckets[b + 1..].iter().sum();
            let fraction = (self.buckets[b] as f64 / self.bucket_width(b))
                * (self.right_edge(b) - v as i64) as f64;
            above as f64 + fraction
        } / total;

        match op {
            Op::Equals => eq,
            Op::NotEquals => 1.0 - eq,
            Op::GreaterThan => gt,
            Op::GreaterThanOrEq => gt + eq,
            Op::LessThan => 1.0 - gt - eq,
            Op::LessThanOrEq => 1.0 - gt,
        }
    }
}

/// Equi-count histogram over a string column: strings are bucketed by
/// their first byte, giving a coarse but cheap selectivity estimate.
/// COUNT is the only thing callers need from string columns here, so a
/// full ordered histogram is not worth the complexity.
#[derive(Debug, Clone)]
pub struct StringHistogram {
    inner: IntHistogram,
}

impl StringHistogram {
    pub fn new(num_buckets: usize) -> StringHistogram {
        StringHistogram {
            inner: IntHistogram::new(num_buckets, 0, 255),
        }
    }

    fn key_of(s: &str) -> i32 {
        s.bytes().next().unwrap_or(0) as i32
    }

    pub fn add_value(&mut self, s: &str) {
        self.inner.add_value(Self::key_of(s));
    }

    pub fn estimate_selectivity(&self, op: Op, s: &str) -> f64 {
        self.inner.estimate_selectivity(op, Self::key_of(s))
    }
}

#[derive(Debug, Clone)]
pub enum Histogram {
    Int(IntHistogram),
    Str(StringHistogram),
}

impl Histogram {
    pub fn estimate_selectivity(&self, op: Op, field: &Field) -> f64 {
        match (self, field) {
            (Histogram::Int(h), Field::Int(v)) => h.estimate_selectivity(op, *v),
            (Histogram::Str(h), Field::Str(s)) => h.estimate_selectivity(op, s),
            _ => 1.0,
        }
    }
}

const NUM_HIST_BUCKETS: usize = 100;

/// Per-table statistics: one histogram per column plus row/page counts,
/// used by a cost-based caller to estimate scan cost and predicate
/// selectivity without touching disk. Built once (`TableStats::compute`)
/// and treated as read-only afterwards.
pub struct TableStats {
    table_id: TableId,
    num_pages: usize,
    num_tuples: u64,
    histograms: Vec<Histogram>,
    desc: Arc<TupleDesc>,
}

impl TableStats {
    /// Scans the table twice: once to find each int column's min/max (the
    /// range a histogram needs up front), once to populate the buckets.
    pub fn compute(db: &Database, table_id: TableId, tid: TransactionId) -> DbResult<TableStats> {
        let heap_file = db.catalog().heap_file(table_id)?;
        let desc = heap_file.tuple_desc();
        let num_pages = heap_file.num_pages();

        let mut mins = vec![i32::MAX; desc.num_fields()];
        let mut maxes = vec![i32::MIN; desc.num_fields()];
        let mut num_tuples: u64 = 0;

        for result in heap_file.iter(db, tid) {
            let tuple = result?;
            num_tuples += 1;
            for i in 0..desc.num_fields() {
                if let Field::Int(v) = tuple.field(i)? {
                    mins[i] = mins[i].min(*v);
                    maxes[i] = maxes[i].max(*v);
                }
            }
        }

        let mut histograms = Vec::with_capacity(desc.num_fields());
        for i in 0..desc.num_fields() {
            histograms.push(match desc.field_type(i)? {
                FieldType::Int => {
                    let (min, max) = if mins[i] > maxes[i] {
                        (0, 0)
                    } else {
                        (mins[i], maxes[i])
                    };
                    Histogram::Int(IntHistogram::new(NUM_HIST_BUCKETS, min, max))
                }
                FieldType::Str => Histogram::Str(StringHistogram::new(NUM_HIST_BUCKETS)),
            });
        }

        for result in heap_file.iter(db, tid) {
            let tuple = result?;
            for i in 0..desc.num_fields() {
                match (&mut histograms[i], tuple.field(i)?) {
                    (Histogram::Int(h), Field::Int(v)) => h.add_value(*v),
                    (Histogram::Str(h), Field::Str(s)) => h.add_value(s),
                    _ => {}
                }
            }
        }

        info!(
            "built table stats for {:?}: {} tuples over {} pages",
            table_id, num_tuples, num_pages
        );

        Ok(TableStats {
            table_id,
            num_pages,
            num_tuples,
            histograms,
            desc,
        })
    }

    pub fn estimate_scan_cost(&self) -> f64 {
        IO_COST_PER_PAGE * self.num_pages as f64
    }

    pub fn estimate_table_cardinality(&self, selectivity: f64) -> u64 {
        (selectivity * self.num_tuples as f64).round() as u64
    }

    pub fn estimate_selectivity(&self, field_index: usize, op: Op, constant: &Field) -> f64 {
        match self.histograms.get(field_index) {
            Some(h) => h.estimate_selectivity(op, constant),
            None => 1.0,
        }
    }

    pub fn num_tuples(&self) -> u64 {
        self.num_tuples
    }

    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }
}

/// Finds the (min, max) of an iterator of ints, used by callers building a
/// histogram from an ad hoc column instead of a full `TableStats::compute`
/// pass (e.g. a test fixture).
pub fn min_max(values: impl Iterator<Item = i32>) -> Option<(i32, i32)> {
    match values.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
    }
}
