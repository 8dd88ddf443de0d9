//! In-process rank group backed by channels.
//!
//! Used to exercise the multi-rank protocol in tests without an MPI launcher.
//! [`LocalGroup::create`] hands out one [`LocalComm`] per rank; each is meant
//! to be moved onto its own thread. Messages travel as type-erased boxes and
//! are checked against the expected type on receipt.

use std::any::Any;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::comm::{CommError, Communicator, Payload};

type Message = Box<dyn Any + Send>;

/// Factory for in-process rank groups.
pub struct LocalGroup;

impl LocalGroup {
    /// Create a fully connected group of `size` ranks.
    pub fn create(size: usize) -> Vec<LocalComm> {
        let (senders, inboxes): (Vec<Sender<Message>>, Vec<Receiver<Message>>) =
            (0..size).map(|_| channel()).unzip();
        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalComm {
                rank,
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(peer, sender)| (peer != rank).then(|| sender.clone()))
                    .collect(),
                inbox,
            })
            .collect()
    }
}

/// One rank of a [`LocalGroup`].
pub struct LocalComm {
    rank: usize,
    /// Senders to every other rank; `None` in this rank's own slot.
    peers: Vec<Option<Sender<Message>>>,
    inbox: Receiver<Message>,
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn broadcast<T: Payload>(
        &self,
        root: usize,
        value: Option<T>,
    ) -> Result<Option<T>, CommError> {
        let size = self.size();
        if root >= size {
            return Err(CommError::InvalidRoot { root, size });
        }

        if self.rank == root {
            for (rank, peer) in self.peers.iter().enumerate() {
                let Some(peer) = peer else { continue };
                peer.send(Box::new(value.clone()))
                    .map_err(|_| CommError::Disconnected { rank })?;
            }
            Ok(value)
        } else {
            let payload = self
                .inbox
                .recv()
                .map_err(|_| CommError::Disconnected { rank: self.rank })?;
            payload
                .downcast::<Option<T>>()
                .map(|boxed| *boxed)
                .map_err(|_| CommError::PayloadType { rank: self.rank })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_ranks_are_numbered() {
        let group = LocalGroup::create(3);
        let ranks: Vec<usize> = group.iter().map(|c| c.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert!(group.iter().all(|c| c.size() == 3));
    }

    #[test]
    fn test_broadcast_reaches_every_rank() {
        let received: Vec<Option<Vec<u32>>> = thread::scope(|s| {
            let handles: Vec<_> = LocalGroup::create(4)
                .into_iter()
                .map(|comm| {
                    s.spawn(move || {
                        let value = (comm.rank() == 0).then(|| vec![1, 2, 3]);
                        comm.broadcast(0, value).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(received.iter().all(|v| v.as_deref() == Some(&[1, 2, 3][..])));
    }

    #[test]
    fn test_wrong_payload_type_detected() {
        let mut group = LocalGroup::create(2);
        let receiver = group.pop().unwrap();
        let root = group.pop().unwrap();
        root.broadcast(0, Some(1.5_f64)).unwrap();
        assert!(matches!(
            receiver.broadcast::<u32>(0, None),
            Err(CommError::PayloadType { rank: 1 })
        ));
    }

    #[test]
    fn test_dropped_root_disconnects() {
        let mut group = LocalGroup::create(2);
        let receiver = group.pop().unwrap();
        drop(group);
        assert!(matches!(
            receiver.broadcast::<u32>(0, None),
            Err(CommError::Disconnected { rank: 1 })
        ));
        assert!(matches!(
            receiver.broadcast::<u32>(5, None),
            Err(CommError::InvalidRoot { root: 5, size: 2 })
        ));
    }
}
