use crate::types::TelemetryRecord;

/// Append-only, ordered telemetry for one run.
///
/// Records come out in the order they went in. Nothing is ever removed or
/// rewritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryHistory {
    records: Vec<TelemetryRecord>,
}

impl TelemetryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, record: TelemetryRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&TelemetryRecord> {
        self.records.last()
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TelemetryRecord> {
        self.records.iter()
    }
}

impl From<Vec<TelemetryRecord>> for TelemetryHistory {
    fn from(records: Vec<TelemetryRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a TelemetryHistory {
    type Item = &'a TelemetryRecord;
    type IntoIter = std::slice::Iter<'a, TelemetryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoopSample;

    fn record(t: f64) -> TelemetryRecord {
        TelemetryRecord {
            time_s: t,
            loops: [LoopSample::default(); 2],
        }
    }

    #[test]
    fn append_preserves_order() {
        let mut history = TelemetryHistory::new();
        assert!(history.is_empty());
        for t in [0.0, 1.0, 2.0] {
            history.append(record(t));
        }
        assert_eq!(history.len(), 3);
        let times: Vec<f64> = history.iter().map(|r| r.time_s).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(history.last().map(|r| r.time_s), Some(2.0));
    }
}
