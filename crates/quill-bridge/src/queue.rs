//! Outbound queue with acknowledgment-gated flow control
//!
//! At most one message is in flight. A message is released to the transport
//! only when the previous one has been acknowledged by the host; everything
//! else waits in a FIFO. The queue is unbounded and nothing is dropped for
//! backpressure. There is no acknowledgment timeout: if the host never
//! acknowledges, the queue stalls.

use crate::codec::{Codec, Encoded};
use crate::transport::Transport;
use quill_bridge_core::{Event, Result};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// FIFO of pending outbound messages plus the `readyToSend` flag
pub struct OutboundQueue<T: Transport> {
    codec: Codec,
    transport: T,
    pending: VecDeque<Encoded>,
    ready_to_send: bool,
    in_flight: Option<u64>,
}

impl<T: Transport> OutboundQueue<T> {
    pub fn new(codec: Codec, transport: T) -> Self {
        Self {
            codec,
            transport,
            pending: VecDeque::new(),
            ready_to_send: true,
            in_flight: None,
        }
    }

    /// Stamp `event` with the next identifier, append it, and try to send.
    ///
    /// A transport failure leaves the message at the head of the queue and is
    /// returned; the message is still considered enqueued.
    pub fn enqueue(&mut self, event: &Event) -> Result<()> {
        let encoded = self.codec.encode(event)?;
        trace!(
            "Queued message {} ({}), queue length {}",
            encoded.id,
            encoded.kind,
            self.pending.len() + 1
        );
        self.pending.push_back(encoded);
        self.try_send().map(|_| ())
    }

    /// Send the head of the queue if the flow-control flag allows it.
    ///
    /// Returns whether a message was handed to the transport.
    pub fn try_send(&mut self) -> Result<bool> {
        if !self.ready_to_send {
            return Ok(false);
        }
        let Some(next) = self.pending.front() else {
            return Ok(false);
        };

        let preview: String = next.text.chars().take(200).collect();
        debug!("[Bridge→Host] id={} json={}", next.id, preview);

        self.transport.post_message(&next.text)?;

        let id = next.id;
        self.pending.pop_front();
        self.ready_to_send = false;
        self.in_flight = Some(id);
        Ok(true)
    }

    /// Host confirmed the last message: open the flag and release the next one
    pub fn on_acknowledged(&mut self) -> Result<()> {
        match self.in_flight.take() {
            Some(id) => trace!("Message {} acknowledged", id),
            None => debug!("Acknowledgment received with nothing in flight"),
        }
        self.ready_to_send = true;
        self.try_send().map(|_| ())
    }

    /// Whether the next message may be sent right away
    pub fn is_ready(&self) -> bool {
        self.ready_to_send
    }

    /// Number of messages waiting to be sent
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Identifier of the message awaiting acknowledgment, if any
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Identifier the next enqueued message will receive
    pub fn next_message_id(&self) -> u64 {
        self.codec.next_id()
    }

    pub fn prefix(&self) -> &str {
        self.codec.prefix()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
