/// JSON dump of the final packet list

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::protocol::Packet;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize packets: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Write `packets` as a pretty-printed JSON array, replacing any existing file
pub fn write_json(path: &Path, packets: &[Packet]) -> Result<(), OutputError> {
    let io_err = |source: io::Error| OutputError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let file = File::create(path).map_err(io_err)?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, packets)?;
    w.flush().map_err(io_err)?;

    info!(path = %path.display(), count = packets.len(), "JSON output written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_json_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        let packets = [
            Packet { symbol: *b"AAPL", side: b'B', quantity: 10, price: 99, sequence: 1 },
            Packet { symbol: *b"MSFT", side: b'S', quantity: 20, price: 98, sequence: 2 },
        ];

        write_json(&path, &packets).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["Symbol"], "MSFT");
        assert_eq!(entries[1]["BuySellIndicator"], "S");
        assert_eq!(entries[1]["Sequence"], 2);
    }

    #[test]
    fn test_write_json_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }
}
