//! Per-file summary of what was removed.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Name the file was processed under.
    pub file: String,
    /// `//dd:startwrap` regions deleted.
    pub regions: usize,
    /// `//dd:startinstrument` spans deleted.
    pub spans: usize,
    /// `//dd:instrumented` tags stripped.
    pub tags_stripped: usize,
    /// Wrapper calls replaced by their argument, per rule.
    pub unwrapped: BTreeMap<&'static str, usize>,
    /// Inserted statements deleted, per rule.
    pub statements_removed: BTreeMap<&'static str, usize>,
    /// Function literal bodies searched below declaration level.
    pub closures_walked: usize,
    /// Imports deleted because nothing uses them any more.
    pub imports_pruned: Vec<String>,
    /// Markers still present in the output.
    pub markers_left: usize,
}

impl Report {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn total_unwrapped(&self) -> usize {
        self.unwrapped.values().sum()
    }

    pub fn total_statements_removed(&self) -> usize {
        self.statements_removed.values().sum()
    }

    /// True when nothing was removed or rewritten.
    pub fn is_clean(&self) -> bool {
        self.regions == 0
            && self.spans == 0
            && self.tags_stripped == 0
            && self.total_unwrapped() == 0
            && self.total_statements_removed() == 0
            && self.imports_pruned.is_empty()
    }

    pub(crate) fn add_unwrapped(&mut self, counts: &BTreeMap<&'static str, usize>) {
        merge(&mut self.unwrapped, counts);
    }

    pub(crate) fn add_statements_removed(&mut self, counts: &BTreeMap<&'static str, usize>) {
        merge(&mut self.statements_removed, counts);
    }
}

fn merge(into: &mut BTreeMap<&'static str, usize>, counts: &BTreeMap<&'static str, usize>) {
    for (name, count) in counts {
        *into.entry(*name).or_default() += count;
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "{}: clean", self.file);
        }
        write!(
            f,
            "{}: {} regions, {} spans, {} tags, {} unwrapped, {} statements removed",
            self.file,
            self.regions,
            self.spans,
            self.tags_stripped,
            self.total_unwrapped(),
            self.total_statements_removed()
        )?;
        if !self.imports_pruned.is_empty() {
            write!(f, ", pruned {}", self.imports_pruned.join(", "))?;
        }
        if self.markers_left > 0 {
            write!(f, " ({} markers left)", self.markers_left)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report() {
        let report = Report::new("a.go");
        assert!(report.is_clean());
        assert_eq!(report.to_string(), "a.go: clean");
    }

    #[test]
    fn test_counts_merge() {
        let mut report = Report::new("a.go");
        report.add_unwrapped(&BTreeMap::from([("grpc", 2)]));
        report.add_unwrapped(&BTreeMap::from([("grpc", 1), ("client", 1)]));
        report.regions = 1;
        assert_eq!(report.unwrapped.get("grpc"), Some(&3));
        assert_eq!(report.total_unwrapped(), 4);
        assert!(!report.is_clean());
        assert_eq!(
            report.to_string(),
            "a.go: 1 regions, 0 spans, 0 tags, 4 unwrapped, 0 statements removed"
        );
    }

    #[test]
    fn test_serializes_to_json() {
        let mut report = Report::new("a.go");
        report.add_statements_removed(&BTreeMap::from([("gin", 1)]));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["file"], "a.go");
        assert_eq!(json["statements_removed"]["gin"], 1);
        assert_eq!(json["imports_pruned"], serde_json::json!([]));
    }
}
