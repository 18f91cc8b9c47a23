/// Simulated BetaCrew exchange
///
/// Listens on a TCP port and answers the client protocol: a stream-all request
/// replays the order book feed with some packets randomly dropped, then closes
/// the connection; resend requests are answered one packet each until the
/// client hangs up.
///
/// Usage: mock_exchange [port] [packet_count] [drop_probability]

use std::env;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};

use betacrew_client::{Packet, RequestKind, REQUEST_SIZE};
use rand::Rng;

const SYMBOLS: [&[u8; 4]; 5] = [b"AAPL", b"MSFT", b"AMZN", b"META", b"TSLA"];

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let port: u16 = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(3000);
    // resend targets are one byte wide
    let packet_count: i32 = args.get(2).and_then(|a| a.parse().ok()).unwrap_or(14).clamp(1, 255);
    let drop_probability: f64 = args.get(3).and_then(|a| a.parse().ok()).unwrap_or(0.2);

    let mut rng = rand::thread_rng();
    let book: Vec<Packet> = (1..=packet_count)
        .map(|sequence| Packet {
            symbol: *SYMBOLS[rng.gen_range(0..SYMBOLS.len())],
            side: if rng.gen_bool(0.5) { b'B' } else { b'S' },
            quantity: rng.gen_range(1..1000),
            price: rng.gen_range(50..500),
            sequence,
        })
        .collect();

    let listener = TcpListener::bind(("0.0.0.0", port))?;
    println!("Mock exchange on port {} with {} packets", port, packet_count);

    for conn in listener.incoming() {
        let sock = conn?;
        if let Err(e) = serve(sock, &book, drop_probability, &mut rng) {
            println!("Connection ended with error: {}", e);
        }
    }

    Ok(())
}

fn serve(mut sock: TcpStream, book: &[Packet], drop_probability: f64, rng: &mut impl Rng) -> std::io::Result<()> {
    loop {
        let mut req = [0u8; REQUEST_SIZE];
        match sock.read_exact(&mut req) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        }

        match RequestKind::from_u8(req[0]) {
            Some(RequestKind::StreamAll) => {
                let mut dropped = 0;
                for (idx, packet) in book.iter().enumerate() {
                    // last packet is always delivered
                    let is_last = idx + 1 == book.len();
                    if !is_last && rng.gen_bool(drop_probability) {
                        dropped += 1;
                        continue;
                    }
                    sock.write_all(&packet.to_frame())?;
                }
                println!("Streamed {} packets, dropped {}", book.len() - dropped, dropped);
                return Ok(());
            }
            Some(RequestKind::Resend) => {
                match book.iter().find(|p| p.sequence == req[1] as i32) {
                    Some(packet) => {
                        sock.write_all(&packet.to_frame())?;
                        println!("Resent sequence {}", req[1]);
                    }
                    None => {
                        println!("Unknown sequence {}, closing", req[1]);
                        return Ok(());
                    }
                }
            }
            None => {
                println!("Unknown request kind {}, closing", req[0]);
                return Ok(());
            }
        }
    }
}
