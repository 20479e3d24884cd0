//! Process group context with point-to-point operations.
use crate::frame::{read_frame, write_frame, Frame};
use crate::{Error, Handle, Result, Tag};
use layout::IndexedLayout;
use log::{debug, error};
use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::net::Shutdown;
use std::rc::Rc;

pub struct Context {
    handle: Rc<RefCell<Handle>>,
}

impl Context {
    pub(crate) fn new(handle: Rc<RefCell<Handle>>) -> Context {
        Context { handle }
    }

    /// Rank of this process within the group.
    pub fn rank(&self) -> usize {
        self.handle.borrow().rank
    }

    /// Number of processes in the group.
    pub fn size(&self) -> usize {
        self.handle.borrow().size
    }

    /// Send the elements of `buf` named by `region` to `dest` (blocking).
    ///
    /// Returns once the payload has been handed off to the transport; the
    /// caller may reuse or drop `buf` afterward. The receiver must use a
    /// region describing the same element layout; the engine does not verify
    /// this across the wire.
    pub fn send_indexed<T>(
        &self,
        buf: &[T],
        region: &IndexedLayout,
        dest: usize,
        tag: Tag,
    ) -> Result<()>
    where
        T: Serialize + Copy,
    {
        self.check_peer(dest)?;
        let packed = region.pack(buf).map_err(Error::Layout)?;
        let bytes = rmp_serde::to_vec(&packed).map_err(|_| Error::SerializeError)?;
        let mut handle = self.handle.borrow_mut();
        let stream = handle.peers[dest].as_mut().ok_or(Error::SelfMessage)?;
        write_frame(stream, &Frame::Data { tag, bytes })?;
        debug!("sent {} elements to rank {} (tag {})", region.total_len(), dest, tag);
        Ok(())
    }

    /// Receive into the offsets of `buf` named by `region` from `source`
    /// (blocking).
    ///
    /// On return every offset named by `region` holds the element the source
    /// sent for that offset; all other offsets keep their pre-call value.
    pub fn recv_indexed<T>(
        &self,
        buf: &mut [T],
        region: &IndexedLayout,
        source: usize,
        tag: Tag,
    ) -> Result<()>
    where
        T: DeserializeOwned + Copy,
    {
        self.check_peer(source)?;
        let frame = {
            let mut handle = self.handle.borrow_mut();
            let stream = handle.peers[source].as_mut().ok_or(Error::SelfMessage)?;
            read_frame(stream)?
        };
        match frame {
            Frame::Data { tag: actual, bytes } => {
                if actual != tag {
                    return Err(Error::MessageTagMismatch {
                        expected: tag,
                        actual,
                    });
                }
                let elems: Vec<T> =
                    rmp_serde::from_slice(&bytes).map_err(|_| Error::DeserializeError)?;
                if elems.len() != region.total_len() {
                    return Err(Error::MessageCountMismatch);
                }
                region.unpack(&elems, buf).map_err(Error::Layout)?;
                debug!("received {} elements from rank {} (tag {})", elems.len(), source, tag);
                Ok(())
            }
            Frame::Abort { code } => self.exit_on_abort(code),
            Frame::Barrier => Err(Error::MessageTypeMismatch),
        }
    }

    /// Block until every member of the group has entered the barrier.
    ///
    /// Rank 0 gathers an arrival marker from every other rank, then releases
    /// them all.
    pub fn barrier(&self) -> Result<()> {
        let (rank, size) = {
            let handle = self.handle.borrow();
            (handle.rank, handle.size)
        };
        if size == 1 {
            return Ok(());
        }
        if rank == 0 {
            for peer in 1..size {
                self.expect_barrier(peer)?;
            }
            for peer in 1..size {
                self.send_ctl(peer, &Frame::Barrier)?;
            }
        } else {
            self.send_ctl(0, &Frame::Barrier)?;
            self.expect_barrier(0)?;
        }
        Ok(())
    }

    /// Terminate the whole group: deliver an abort notice to every peer,
    /// then exit this process with `code`.
    ///
    /// A peer observes the notice when it next reads the aborting rank's
    /// stream (blocking receive, or a barrier involving that rank) and exits
    /// with the same code. A rank blocked on some other peer's stream sees
    /// that stream close instead and surfaces `Error::Io` to its caller,
    /// which must treat it as fatal.
    pub fn abort(&self, code: i32) -> ! {
        error!("aborting group with code {}", code);
        let mut handle = self.handle.borrow_mut();
        for peer in handle.peers.iter_mut().flatten() {
            let _ = write_frame(peer, &Frame::Abort { code });
            let _ = peer.shutdown(Shutdown::Both);
        }
        std::process::exit(code);
    }

    /// A transfer is only meaningful toward another valid member of a group
    /// of at least two.
    fn check_peer(&self, peer: usize) -> Result<()> {
        let handle = self.handle.borrow();
        if handle.size < 2 {
            return Err(Error::GroupTooSmall);
        }
        if peer >= handle.size {
            return Err(Error::InvalidRank(peer));
        }
        if peer == handle.rank {
            return Err(Error::SelfMessage);
        }
        Ok(())
    }

    fn send_ctl(&self, peer: usize, frame: &Frame) -> Result<()> {
        let mut handle = self.handle.borrow_mut();
        let stream = handle.peers[peer].as_mut().ok_or(Error::SelfMessage)?;
        write_frame(stream, frame)
    }

    fn expect_barrier(&self, peer: usize) -> Result<()> {
        let frame = {
            let mut handle = self.handle.borrow_mut();
            let stream = handle.peers[peer].as_mut().ok_or(Error::SelfMessage)?;
            read_frame(stream)?
        };
        match frame {
            Frame::Barrier => Ok(()),
            Frame::Abort { code } => self.exit_on_abort(code),
            Frame::Data { .. } => Err(Error::MessageTypeMismatch),
        }
    }

    /// Another member aborted the group; follow it down with the same code.
    fn exit_on_abort(&self, code: i32) -> ! {
        error!("received abort notice (code {})", code);
        std::process::exit(code);
    }
}
