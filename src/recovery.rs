/// Replay and gap recovery
///
/// Drives one run through its phases:
///
///   Idle -> StreamingAll -> GapsComputed -> RecoveringMissing -> Done
///
/// with `Failed` reachable from any of them. Each network phase owns its own
/// session and closes it before the next phase starts. Output is only handed
/// back once the run reaches `Done`.

use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::decoder::Decoder;
use crate::error::ClientError;
use crate::gap_detector::GapDetector;
use crate::protocol::{
    encode_bulk_request, encode_recovery_request, Packet, MAX_RECOVERY_SEQUENCE, PACKET_SIZE,
};
use crate::session::Session;
use crate::stats::RunStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    StreamingAll,
    GapsComputed,
    RecoveringMissing,
    Done,
    Failed,
}

#[derive(Debug)]
pub struct RecoveryEngine {
    config: ClientConfig,
    phase: Phase,
    stats: RunStats,
}

impl RecoveryEngine {
    pub fn new(config: ClientConfig) -> Self {
        RecoveryEngine {
            config,
            phase: Phase::Idle,
            stats: RunStats::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run every phase and return the valid packets sorted by sequence
    pub fn run(&mut self) -> Result<Vec<Packet>, ClientError> {
        let result = self.run_phases();
        let packets = self.fail_on_err(result)?;
        self.phase = Phase::Done;
        self.stats.log_summary();
        Ok(packets)
    }

    /// Move to `Failed` if `result` is an error, logging the phase it came from
    fn fail_on_err<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(e) = &result {
            if self.phase != Phase::Failed {
                error!(phase = ?self.phase, error = %e, "run failed");
                self.phase = Phase::Failed;
            }
        }
        result
    }

    fn run_phases(&mut self) -> Result<Vec<Packet>, ClientError> {
        let mut packets = self.stream_all()?;

        let mut detector = GapDetector::new();
        for packet in &packets {
            detector.process(packet.sequence);
        }
        let gap_count = detector.missing_count()?;
        if gap_count > MAX_RECOVERY_SEQUENCE as usize {
            warn!(
                count = gap_count,
                max_sequence = ?detector.max_sequence(),
                "gap list exceeds the addressable resend range"
            );
        }
        let missing = detector.missing()?;
        self.phase = Phase::GapsComputed;
        self.stats.record_gaps(missing.len());
        info!(count = missing.len(), "missing packets");

        let recovered = self.recover_missing(&missing)?;
        packets.extend(recovered);

        let before = packets.len();
        let merged = merge(packets);
        self.stats.record_duplicates((before - merged.len()) as u64);

        // recovered packets, mismatched ones included, now count as seen
        for packet in &merged {
            detector.process(packet.sequence);
        }
        let unrecovered: Vec<i32> = missing.into_iter().filter(|&seq| !detector.contains(seq)).collect();
        if !unrecovered.is_empty() {
            warn!(count = unrecovered.len(), sequences = ?unrecovered, "sequences not recovered");
        }
        self.stats.set_unrecovered(unrecovered);

        Ok(merged)
    }

    fn open_session(&self) -> Result<Session, ClientError> {
        let session = Session::open(
            &self.config.host,
            self.config.port,
            self.config.connect_attempts,
            self.config.read_timeout,
        )?;
        Ok(session)
    }

    /// Request the full replay and read frames until the server closes the stream
    pub fn stream_all(&mut self) -> Result<Vec<Packet>, ClientError> {
        self.phase = Phase::StreamingAll;
        let result = self.read_bulk_stream();
        self.fail_on_err(result)
    }

    fn read_bulk_stream(&mut self) -> Result<Vec<Packet>, ClientError> {
        let mut session = self.open_session()?;

        session.write_frame(&encode_bulk_request())?;
        info!("request \"stream all packets\" sent");

        let mut packets = Vec::new();
        loop {
            let frame = session.read_frame(PACKET_SIZE)?;
            if frame.is_empty() {
                break;
            }
            self.stats.record_frame(frame.len());

            let packet = Decoder::decode(&frame)?;
            if let Some(packet) = self.accept(packet) {
                packets.push(packet);
            }
        }
        session.close();

        info!(count = packets.len(), "received \"stream all packets\"");
        Ok(packets)
    }

    /// Resend each missing sequence over a fresh session, one request at a time.
    ///
    /// Stops early, without error, if the server closes the stream or a
    /// sequence is beyond what a resend request can address.
    pub fn recover_missing(&mut self, missing: &[i32]) -> Result<Vec<Packet>, ClientError> {
        self.phase = Phase::RecoveringMissing;
        let result = self.request_resends(missing);
        self.fail_on_err(result)
    }

    fn request_resends(&mut self, missing: &[i32]) -> Result<Vec<Packet>, ClientError> {
        if missing.is_empty() {
            debug!("no gaps, skipping recovery session");
            return Ok(Vec::new());
        }

        let mut session = self.open_session()?;
        let mut recovered = Vec::with_capacity(missing.len());

        for (idx, &seq) in missing.iter().enumerate() {
            let request = match encode_recovery_request(seq) {
                Ok(request) => request,
                Err(e) => {
                    // ascending input: everything from here on is out of range too
                    let remaining = missing.len() - idx;
                    warn!(error = %e, remaining, "stopping recovery at protocol limit");
                    self.stats.record_unaddressable(remaining);
                    break;
                }
            };

            session.write_frame(&request)?;
            self.stats.record_request();

            let frame = session.read_frame(PACKET_SIZE)?;
            if frame.is_empty() {
                warn!(sequence = seq, "server closed recovery stream early");
                break;
            }
            self.stats.record_frame(frame.len());

            let packet = Decoder::decode(&frame)?;
            if packet.sequence != seq {
                warn!(requested = seq, received = packet.sequence, "resend response for a different sequence");
                self.stats.record_mismatch();
            }
            if let Some(packet) = self.accept(packet) {
                self.stats.record_recovered();
                recovered.push(packet);
            }
        }
        session.close();

        info!(requested = missing.len(), recovered = recovered.len(), "received missing packets");
        Ok(recovered)
    }

    fn accept(&mut self, packet: Packet) -> Option<Packet> {
        match packet.validate() {
            Ok(()) => Some(packet),
            Err(reason) => {
                warn!(sequence = packet.sequence, %reason, "invalid packet dropped");
                self.stats.record_rejected();
                None
            }
        }
    }
}

/// Sort by sequence, keeping the first packet seen for each sequence number
pub fn merge(mut packets: Vec<Packet>) -> Vec<Packet> {
    packets.sort_by_key(|p| p.sequence);
    packets.dedup_by_key(|p| p.sequence);
    packets
}
