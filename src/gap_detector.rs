/// Sequence number gap detection
///
/// Collects the sequence numbers that arrived and reports every number in
/// `[1, max)` that did not. The highest sequence seen is assumed delivered:
/// if the true last packet was dropped it is never reported missing.

use std::collections::BTreeSet;

use crate::protocol::Packet;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapError {
    #[error("no packets received: cannot bound the gap scan")]
    EmptyInput,
}

#[derive(Debug, Clone, Default)]
pub struct GapDetector {
    seen: BTreeSet<i32>,
}

impl GapDetector {
    pub fn new() -> Self {
        GapDetector {
            seen: BTreeSet::new(),
        }
    }

    /// Record a received sequence number
    pub fn process(&mut self, seq_num: i32) {
        self.seen.insert(seq_num);
    }

    pub fn max_sequence(&self) -> Option<i32> {
        self.seen.iter().next_back().copied()
    }

    pub fn contains(&self, seq_num: i32) -> bool {
        self.seen.contains(&seq_num)
    }

    /// Number of distinct sequence numbers recorded
    pub fn received(&self) -> usize {
        self.seen.len()
    }

    /// Number of missing sequence numbers in `[1, max_sequence)`, without
    /// building the list
    pub fn missing_count(&self) -> Result<usize, GapError> {
        let max_seq = self.max_sequence().ok_or(GapError::EmptyInput)?;
        if max_seq <= 1 {
            return Ok(0);
        }
        let present = self.seen.range(1..max_seq).count();
        Ok((max_seq - 1) as usize - present)
    }

    /// Missing sequence numbers in `[1, max_sequence)`, ascending.
    ///
    /// Allocates one entry per gap, so a single packet carrying a huge
    /// sequence (up to `i32::MAX`) costs gigabytes. Check `missing_count`
    /// first when the peer is not trusted.
    pub fn missing(&self) -> Result<Vec<i32>, GapError> {
        let max_seq = self.max_sequence().ok_or(GapError::EmptyInput)?;
        Ok((1..max_seq).filter(|seq| !self.seen.contains(seq)).collect())
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

/// Missing sequence numbers across a batch of received packets
pub fn find_missing(packets: &[Packet]) -> Result<Vec<i32>, GapError> {
    let mut detector = GapDetector::new();
    for packet in packets {
        detector.process(packet.sequence);
    }
    detector.missing()
}
