//! Inference metrics for algojobs.
//!
//! Every inference request produces one [`InferenceRecord`]. The default
//! [`InMemoryCollector`] keeps the most recent records and summarises them.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Records kept by [`InMemoryCollector::default`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// Which inference route produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Rank,
    RankJobs,
    Embed,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Rank => "rank",
            Operation::RankJobs => "rank_jobs",
            Operation::Embed => "embed",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics for a single inference request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRecord {
    pub request_id: Uuid,
    pub operation: Operation,
    /// Resumes or texts in the request.
    pub items: usize,
    pub elapsed_ms: u64,
    pub success: bool,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl InferenceRecord {
    pub fn new(operation: Operation, items: usize, elapsed_ms: u64, success: bool) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            operation,
            items,
            elapsed_ms,
            success,
            timestamp: now_millis(),
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Aggregate over the records a collector currently holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub total_items: u64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
}

/// Trait for metrics collectors.
pub trait MetricsCollector: Send + Sync {
    fn record(&self, record: InferenceRecord);
    /// Most recent first.
    fn recent(&self, limit: usize) -> Vec<InferenceRecord>;
    fn summary(&self) -> MetricsSummary;
}

/// Ring buffer of the latest records.
pub struct InMemoryCollector {
    capacity: usize,
    records: Mutex<VecDeque<InferenceRecord>>,
}

impl InMemoryCollector {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }
}

impl Default for InMemoryCollector {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MetricsCollector for InMemoryCollector {
    fn record(&self, record: InferenceRecord) {
        let Ok(mut guard) = self.records.lock() else {
            tracing::warn!("Failed to acquire metrics lock");
            return;
        };
        tracing::debug!(
            request_id = %record.request_id,
            operation = %record.operation,
            items = record.items,
            elapsed_ms = record.elapsed_ms,
            success = record.success,
            "Recorded inference metrics"
        );
        if guard.len() == self.capacity {
            guard.pop_front();
        }
        guard.push_back(record);
    }

    fn recent(&self, limit: usize) -> Vec<InferenceRecord> {
        let Ok(guard) = self.records.lock() else {
            return Vec::new();
        };
        guard.iter().rev().take(limit).cloned().collect()
    }

    fn summary(&self) -> MetricsSummary {
        let Ok(guard) = self.records.lock() else {
            return MetricsSummary::default();
        };

        let mut summary = MetricsSummary::default();
        let mut total_latency = 0u64;
        for r in guard.iter() {
            summary.total_requests += 1;
            if !r.success {
                summary.failed_requests += 1;
            }
            summary.total_items += r.items as u64;
            summary.max_latency_ms = summary.max_latency_ms.max(r.elapsed_ms);
            total_latency += r.elapsed_ms;
        }
        if summary.total_requests > 0 {
            summary.avg_latency_ms = total_latency as f64 / summary.total_requests as f64;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_collector() {
        let collector = InMemoryCollector::default();

        collector.record(InferenceRecord::new(Operation::Rank, 10, 120, true));
        collector.record(InferenceRecord::new(Operation::Embed, 3, 30, true));
        collector.record(InferenceRecord::new(Operation::RankJobs, 5, 300, false));

        let summary = collector.summary();
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.failed_requests, 1);
        assert_eq!(summary.total_items, 18);
        assert_eq!(summary.max_latency_ms, 300);
        assert!((summary.avg_latency_ms - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary() {
        let summary = InMemoryCollector::new(4).summary();
        assert_eq!(summary, MetricsSummary::default());
    }

    #[test]
    fn test_oldest_records_are_evicted() {
        let collector = InMemoryCollector::new(2);
        for items in 1..=3 {
            collector.record(InferenceRecord::new(Operation::Rank, items, 1, true));
        }

        let recent = collector.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].items, 3);
        assert_eq!(recent[1].items, 2);
        assert_eq!(collector.summary().total_items, 5);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = InferenceRecord::new(Operation::Embed, 1, 1, true);
        let b = InferenceRecord::new(Operation::Embed, 1, 1, true);
        assert_ne!(a.request_id, b.request_id);
        assert!(a.timestamp > 0);
    }

    #[test]
    fn test_record_serialization() {
        let record = InferenceRecord::new(Operation::RankJobs, 2, 7, true);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["operation"], "rank_jobs");
        assert_eq!(json["items"], 2);
    }
}
