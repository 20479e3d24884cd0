//! TCP bootstrap: full-mesh connection establishment between group members.
//!
//! Each rank binds its own listen address, dials every higher rank, and
//! accepts a connection from every lower rank. The dialing side identifies
//! itself with a small hello message.
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::prelude::*;
use std::net::{SocketAddr, TcpListener, TcpStream};

#[derive(Serialize, Deserialize)]
struct Hello {
    /// Rank of the dialing process.
    rank: usize,
}

/// Attempt to connect to the peer multiple times, until its listener is up.
fn stream_connect(addr: &SocketAddr) -> TcpStream {
    loop {
        match TcpStream::connect(addr) {
            Ok(stream) => return stream,
            Err(_) => (),
        }
    }
}

/// Establish one stream per peer and return them indexed by rank.
pub(crate) fn connect_group(rank: usize, conns: &[SocketAddr]) -> Vec<Option<TcpStream>> {
    let listener = TcpListener::bind(conns[rank]).expect("failed to bind listen address");
    let mut peers: Vec<Option<TcpStream>> = (0..conns.len()).map(|_| None).collect();

    for peer in rank + 1..conns.len() {
        let mut stream = stream_connect(&conns[peer]);
        stream.set_nodelay(true).expect("failed to set TCP_NODELAY");
        serde_json::to_writer(&mut stream, &Hello { rank }).expect("failed to send hello");
        stream.flush().expect("failed to flush stream");
        debug!("rank {} connected to rank {}", rank, peer);
        let _ = peers[peer].insert(stream);
    }

    for _ in 0..rank {
        let (mut stream, _) = listener
            .accept()
            .expect("failed to accept peer connection");
        stream.set_nodelay(true).expect("failed to set TCP_NODELAY");
        // Read exactly one JSON value; the stream stays open for messaging.
        let mut de = serde_json::Deserializer::from_reader(&mut stream);
        let hello = Hello::deserialize(&mut de).expect("failed to read hello");
        assert!(hello.rank < rank, "unexpected rank {} in hello", hello.rank);
        assert!(peers[hello.rank].is_none(), "duplicate connection from rank {}", hello.rank);
        debug!("rank {} accepted connection from rank {}", rank, hello.rank);
        let _ = peers[hello.rank].insert(stream);
    }

    peers
}
