//! Append-only buffer of captured points and its two serializers.
//!
//! Insertion order is capture order and both serializers preserve it. A
//! serializer is a pure read: calling it twice without an intervening
//! [`DataSet::add`] yields byte-identical output.

use std::collections::BTreeSet;

use crate::point::DataPoint;

/// Default CSV delimiter.
pub const DEFAULT_DELIMITER: char = ',';
/// Default replacement for delimiter characters found inside CSV fields.
pub const DEFAULT_DELIMITER_REPLACEMENT: char = '.';

/// Ordered, append-only sequence of [`DataPoint`]s owned by one channel.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    points: Vec<DataPoint>,
    measurement_names: BTreeSet<String>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, point: DataPoint) {
        if !self.measurement_names.contains(point.measurement()) {
            self.measurement_names
                .insert(point.measurement().to_string());
        }
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Distinct measurement names seen so far.
    pub fn measurement_names(&self) -> &BTreeSet<String> {
        &self.measurement_names
    }

    /// Drop every buffered point.
    pub fn reset(&mut self) {
        self.points.clear();
        self.measurement_names.clear();
    }

    /// One line-protocol line per point, each terminated by `\n`.
    pub fn serialize_line_protocol(&self) -> String {
        let mut out = String::new();
        for point in &self.points {
            out.push_str(&point.to_line_protocol());
            out.push('\n');
        }
        out
    }

    /// One `time<d>measurement<d>value` row per point, each terminated by `\n`.
    pub fn serialize_csv(&self, delimiter: char, replacement: char) -> String {
        let mut out = String::new();
        for point in &self.points {
            out.push_str(&point.to_csv_row(delimiter, replacement));
            out.push('\n');
        }
        out
    }
}
