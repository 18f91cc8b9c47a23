/// Blocking TCP session to the exchange
///
/// One session per phase: open with bounded retry, write request frames, read
/// fixed-size response frames, close. Only the connect is retried; any
/// read/write failure on an open session is returned to the caller as is.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("connection to {endpoint} failed after {attempts} attempt(s)")]
    ConnectionFailed {
        endpoint: String,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("transport i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("session already closed")]
    Closed,
}

#[derive(Debug)]
pub struct Session {
    stream: Option<TcpStream>,
    endpoint: String,
}

impl Session {
    /// Connect to `host:port`, retrying immediately up to `max_attempts` times.
    ///
    /// `read_timeout` of `None` blocks reads indefinitely.
    pub fn open(
        host: &str,
        port: u16,
        max_attempts: u32,
        read_timeout: Option<Duration>,
    ) -> Result<Self, SessionError> {
        let endpoint = format!("{}:{}", host, port);
        let attempts = max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match TcpStream::connect((host, port)) {
                Ok(stream) => {
                    info!(%endpoint, attempt, "TCP connection succeeded");
                    stream.set_read_timeout(read_timeout)?;
                    stream.set_nodelay(true)?;
                    return Ok(Session {
                        stream: Some(stream),
                        endpoint,
                    });
                }
                Err(e) => {
                    warn!(%endpoint, attempt, max_attempts = attempts, error = %e, "TCP connection failed");
                    last_err = Some(e);
                }
            }
        }

        Err(SessionError::ConnectionFailed {
            endpoint,
            attempts,
            source: last_err.unwrap_or_else(|| io::Error::new(ErrorKind::Other, "no connect attempt made")),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Write the whole frame
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<(), SessionError> {
        let stream = self.stream.as_mut().ok_or(SessionError::Closed)?;
        stream.write_all(frame)?;
        stream.flush()?;
        Ok(())
    }

    /// Read until `max_bytes` have arrived or the peer closes the stream.
    ///
    /// An empty result means the peer closed before sending anything; a
    /// short, non-empty result means it closed mid-frame.
    pub fn read_frame(&mut self, max_bytes: usize) -> Result<Vec<u8>, SessionError> {
        let stream = self.stream.as_mut().ok_or(SessionError::Closed)?;
        let mut buf = vec![0u8; max_bytes];
        let mut filled = 0;

        while filled < max_bytes {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SessionError::Io(e)),
            }
        }

        buf.truncate(filled);
        Ok(buf)
    }

    /// Release the connection. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // peer may already be gone
            let _ = stream.shutdown(Shutdown::Both);
            debug!(endpoint = %self.endpoint, "session closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_connection_refused_exhausts_attempts() {
        // bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = Session::open("127.0.0.1", port, 3, None);
        match result {
            Err(SessionError::ConnectionFailed { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected ConnectionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_read_frame_reassembles_split_writes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut req = [0u8; 2];
            sock.read_exact(&mut req).unwrap();
            sock.write_all(&[1, 2, 3]).unwrap();
            sock.flush().unwrap();
            thread::sleep(Duration::from_millis(20));
            sock.write_all(&[4, 5]).unwrap();
            req
        });

        let mut session = Session::open("127.0.0.1", port, 1, Some(Duration::from_secs(5))).unwrap();
        session.write_frame(&[9, 8]).unwrap();
        let frame = session.read_frame(5).unwrap();
        assert_eq!(frame, vec![1, 2, 3, 4, 5]);

        // server dropped its socket: end of stream
        assert_eq!(server.join().unwrap(), [9, 8]);
        assert!(session.read_frame(5).unwrap().is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut session = Session::open("127.0.0.1", port, 1, None).unwrap();
        assert!(session.is_open());
        session.close();
        session.close();
        assert!(!session.is_open());
        assert!(matches!(session.write_frame(&[1, 0]), Err(SessionError::Closed)));
        assert!(matches!(session.read_frame(17), Err(SessionError::Closed)));
    }

    #[test]
    fn test_read_timeout_surfaces_as_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut session = Session::open("127.0.0.1", port, 1, Some(Duration::from_millis(50))).unwrap();
        let (_held, _) = listener.accept().unwrap();
        assert!(matches!(session.read_frame(17), Err(SessionError::Io(_))));
    }
}
