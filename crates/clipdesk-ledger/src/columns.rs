//! Header resolution: logical column name -> 1-based ledger position.
//!
//! Positions are derived from a live header every time; the schema manager can
//! append columns between a row's first read and its eventual write.

use std::collections::HashMap;

/// Column positions resolved from one header row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnMap {
    positions: HashMap<String, usize>,
    width: usize,
}

impl ColumnMap {
    /// Names are trimmed; blank cells are skipped; the first occurrence of a
    /// repeated name wins.
    pub fn from_header(header: &[String]) -> Self {
        let mut positions = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            positions.entry(name.to_string()).or_insert(idx + 1);
        }
        Self {
            positions,
            width: header.len(),
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name.trim()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of header cells, blanks included.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Names from `required` that this header does not define, in input order.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect()
    }
}
