/// Run statistics
///
/// Counts what each phase of a run saw: frames, rejects, gaps, resends.

use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    start_time: Option<Instant>,
    frames_received: u64,
    bytes_received: u64,
    rejected: u64,
    duplicates: u64,

    // Recovery
    gaps_detected: u64,
    requests_sent: u64,
    recovered: u64,
    mismatches: u64,
    unaddressable: u64,
    unrecovered: Vec<i32>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame read off the wire
    pub fn record_frame(&mut self, size: usize) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        self.frames_received += 1;
        self.bytes_received += size as u64;
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    pub fn record_duplicates(&mut self, count: u64) {
        self.duplicates += count;
    }

    pub fn record_gaps(&mut self, count: usize) {
        self.gaps_detected += count as u64;
    }

    pub fn record_request(&mut self) {
        self.requests_sent += 1;
    }

    pub fn record_recovered(&mut self) {
        self.recovered += 1;
    }

    pub fn record_mismatch(&mut self) {
        self.mismatches += 1;
    }

    pub fn record_unaddressable(&mut self, count: usize) {
        self.unaddressable += count as u64;
    }

    pub fn set_unrecovered(&mut self, sequences: Vec<i32>) {
        self.unrecovered = sequences;
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|st| st.elapsed())
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn gaps_detected(&self) -> u64 {
        self.gaps_detected
    }

    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    pub fn recovered(&self) -> u64 {
        self.recovered
    }

    pub fn mismatches(&self) -> u64 {
        self.mismatches
    }

    pub fn unaddressable(&self) -> u64 {
        self.unaddressable
    }

    /// Sequences still absent after recovery
    pub fn unrecovered(&self) -> &[i32] {
        &self.unrecovered
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn log_summary(&self) {
        info!(
            frames = self.frames_received,
            bytes = self.bytes_received,
            rejected = self.rejected,
            duplicates = self.duplicates,
            gaps = self.gaps_detected,
            requests = self.requests_sent,
            recovered = self.recovered,
            mismatches = self.mismatches,
            unaddressable = self.unaddressable,
            unrecovered = self.unrecovered.len(),
            elapsed_ms = self.elapsed().map(|d| d.as_millis() as u64).unwrap_or(0),
            "run summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_frame() {
        let mut stats = RunStats::new();
        stats.record_frame(17);
        stats.record_frame(17);
        assert_eq!(stats.frames_received(), 2);
        assert_eq!(stats.bytes_received(), 34);
        assert!(stats.elapsed().is_some());
    }

    #[test]
    fn test_recovery_counters() {
        let mut stats = RunStats::new();
        stats.record_gaps(3);
        stats.record_request();
        stats.record_recovered();
        stats.record_mismatch();
        stats.set_unrecovered(vec![4, 9]);
        assert_eq!(stats.gaps_detected(), 3);
        assert_eq!(stats.requests_sent(), 1);
        assert_eq!(stats.recovered(), 1);
        assert_eq!(stats.mismatches(), 1);
        assert_eq!(stats.unrecovered(), &[4, 9]);
    }

    #[test]
    fn test_reset() {
        let mut stats = RunStats::new();
        stats.record_frame(17);
        stats.record_rejected();
        stats.reset();
        assert_eq!(stats.frames_received(), 0);
        assert_eq!(stats.rejected(), 0);
        assert!(stats.elapsed().is_none());
    }
}
