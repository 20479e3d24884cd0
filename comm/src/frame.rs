//! Wire format: length-prefixed MessagePack frames.
use crate::{Error, Result, Tag};
use serde::{Deserialize, Serialize};
use std::io::prelude::*;
use std::net::TcpStream;

/// One message on a peer stream.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) enum Frame {
    /// Packed transfer payload.
    Data { tag: Tag, bytes: Vec<u8> },

    /// Barrier arrival or release marker.
    Barrier,

    /// Group-wide fatal shutdown with an exit code.
    Abort { code: i32 },
}

pub(crate) fn write_frame(stream: &mut TcpStream, frame: &Frame) -> Result<()> {
    let bytes = rmp_serde::to_vec(frame).map_err(|_| Error::SerializeError)?;
    let len: u64 = bytes.len().try_into().map_err(|_| Error::SerializeError)?;
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(&bytes)?;
    stream.flush()?;
    Ok(())
}

pub(crate) fn read_frame(stream: &mut TcpStream) -> Result<Frame> {
    let mut len_bytes = [0u8; std::mem::size_of::<u64>()];
    stream.read_exact(&mut len_bytes)?;
    let len: usize = u64::from_be_bytes(len_bytes)
        .try_into()
        .map_err(|_| Error::DeserializeError)?;
    let mut bytes = vec![0u8; len];
    stream.read_exact(&mut bytes)?;
    rmp_serde::from_slice(&bytes).map_err(|_| Error::DeserializeError)
}
