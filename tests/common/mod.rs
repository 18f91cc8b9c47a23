//! In-process simulated BetaCrew exchange for integration tests
//!
//! Serves one bulk session, then optionally one recovery session, on
//! 127.0.0.1 with an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use betacrew_client::{ClientConfig, Packet};

pub fn packet(sequence: i32) -> Packet {
    Packet {
        symbol: *b"AAPL",
        side: if sequence % 2 == 0 { b'S' } else { b'B' },
        quantity: 10 * sequence,
        price: 100 + sequence,
        sequence,
    }
}

pub fn frames(seqs: &[i32]) -> Vec<Vec<u8>> {
    seqs.iter().map(|&s| packet(s).to_frame().to_vec()).collect()
}

pub struct MockExchange {
    pub port: u16,
    handle: JoinHandle<Vec<[u8; 2]>>,
}

impl MockExchange {
    /// `bulk` is written verbatim after the stream-all request, then the
    /// connection is closed. With `resend = Some(map)` a second connection is
    /// served: each request whose target is in `map` is answered, the first
    /// one that is not closes the connection.
    pub fn spawn(bulk: Vec<Vec<u8>>, resend: Option<HashMap<u8, Vec<u8>>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut req = [0u8; 2];
            sock.read_exact(&mut req).unwrap();
            assert_eq!(req, [1, 0], "first request must be stream all");
            for frame in &bulk {
                sock.write_all(frame).unwrap();
            }
            drop(sock);

            let mut requests = Vec::new();
            if let Some(resend) = resend {
                let (sock, _) = listener.accept().unwrap();
                serve_resends(sock, &resend, &mut requests);
            }
            requests
        });

        MockExchange { port, handle }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            host: "127.0.0.1".into(),
            port: self.port,
            connect_attempts: 2,
            read_timeout: Some(Duration::from_secs(5)),
            ..ClientConfig::default()
        }
    }

    /// Wait for the server thread; returns the resend requests it saw
    pub fn join(self) -> Vec<[u8; 2]> {
        self.handle.join().unwrap()
    }
}

fn serve_resends(mut sock: TcpStream, resend: &HashMap<u8, Vec<u8>>, requests: &mut Vec<[u8; 2]>) {
    sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    loop {
        let mut req = [0u8; 2];
        match sock.read_exact(&mut req) {
            Ok(()) => {}
            Err(e) if matches!(e.kind(), ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset) => return,
            Err(e) => panic!("mock exchange read failed: {}", e),
        }
        requests.push(req);
        assert_eq!(req[0], 2, "recovery session only carries resend requests");

        match resend.get(&req[1]) {
            Some(frame) => sock.write_all(frame).unwrap(),
            None => return,
        }
    }
}

pub fn resend_map(entries: &[(u8, i32)]) -> HashMap<u8, Vec<u8>> {
    entries
        .iter()
        .map(|&(target, seq)| (target, packet(seq).to_frame().to_vec()))
        .collect()
}
