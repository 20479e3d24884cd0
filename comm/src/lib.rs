//! Point-to-point process group communication over TCP.
//!
//! Every rank in the group holds one stream per peer, so delivery between a
//! given pair is reliable and order-preserving. Transfers are driven by an
//! indexed layout descriptor: the sender packs the described elements, the
//! receiver scatters them back to the same offsets.
use log::info;
use std::cell::RefCell;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::rc::Rc;

mod context;
pub use context::Context;
mod exchange;
mod frame;

/// Message tag type.
pub type Tag = u64;

#[derive(Debug)]
pub enum Error {
    /// Rank is outside the group.
    InvalidRank(usize),

    /// Tried to send to or receive from this process itself.
    SelfMessage,

    /// The group does not have enough members for a transfer.
    GroupTooSmall,

    /// Received a control frame where a data frame was expected, or the
    /// other way around.
    MessageTypeMismatch,

    /// Received tag does not match the expected tag.
    MessageTagMismatch { expected: Tag, actual: Tag },

    /// Invalid count of elements received in a message (no partial receives
    /// allowed).
    MessageCountMismatch,

    /// Error occurred during payload serialization.
    SerializeError,

    /// Error occurred during payload deserialization.
    DeserializeError,

    /// Layout could not be applied to the buffer.
    Layout(layout::Error),

    /// I/O failure on a peer stream.
    Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

/// Static description of the process group this process belongs to.
#[derive(Clone, Debug)]
pub struct GroupConfig {
    /// Rank of this process.
    pub rank: usize,

    /// Listen addresses of every rank, indexed by rank.
    pub conns: Vec<SocketAddr>,
}

impl GroupConfig {
    /// Read the group description from the environment.
    pub fn from_env() -> GroupConfig {
        let conns: Vec<SocketAddr> = std::env::var("TRI_CONN_LIST")
            .expect("missing TRI_CONN_LIST in environment required for group initialization")
            .split(',')
            .map(|addr| addr.parse().expect("invalid address in TRI_CONN_LIST"))
            .collect();
        let rank: usize = std::env::var("TRI_RANK")
            .expect("missing TRI_RANK in environment required for group initialization")
            .parse()
            .expect("invalid rank data");
        GroupConfig { rank, conns }
    }
}

/// Handle containing the internal group state.
pub(crate) struct Handle {
    /// Number of processes.
    pub size: usize,

    /// Rank of this process.
    pub rank: usize,

    /// Peer streams, indexed by rank (None at this process's own rank).
    pub peers: Vec<Option<TcpStream>>,
}

impl Drop for Handle {
    fn drop(&mut self) {
        for peer in self.peers.iter().flatten() {
            let _ = peer.shutdown(Shutdown::Both);
        }
    }
}

/// Initialize this process's membership in the group and connect to every
/// peer. Blocks until the full mesh is established.
pub fn init(config: GroupConfig) -> Result<Context> {
    // Tests initialize several contexts per process.
    let _ = env_logger::try_init();

    let size = config.conns.len();
    if config.rank >= size {
        return Err(Error::InvalidRank(config.rank));
    }
    let peers = exchange::connect_group(config.rank, &config.conns);
    info!("rank {} connected to group of {}", config.rank, size);
    Ok(Context::new(Rc::new(RefCell::new(Handle {
        size,
        rank: config.rank,
        peers,
    }))))
}
