/// BetaCrew Client - Exchange Replay and Gap Recovery
///
/// Client for the BetaCrew exchange feed. Requests a full replay of order
/// packets over TCP, finds sequence gaps in what arrived, re-requests each
/// missing packet and hands back a sequence-ordered dataset. Features include:
/// - Fixed-width big-endian packet codec (17-byte frames, 2-byte requests)
/// - Connect-with-retry blocking transport sessions
/// - Sequence gap detection
/// - Per-sequence resend recovery
/// - JSON output and a file-backed diagnostic log

pub mod protocol;
pub mod decoder;
pub mod session;
pub mod gap_detector;
pub mod recovery;
pub mod stats;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use protocol::{Packet, RequestKind, Side, ProtocolError, PACKET_SIZE, REQUEST_SIZE, MAX_RECOVERY_SEQUENCE};
pub use decoder::{Decoder, DecodeError, ValidationError};
pub use session::{Session, SessionError};
pub use gap_detector::{find_missing, GapDetector, GapError};
pub use recovery::{merge, Phase, RecoveryEngine};
pub use stats::RunStats;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use output::OutputError;
