//! TCP broadcast publisher.
//!
//! Owns a non-blocking listener and a list of connected clients. Each
//! published sample is framed as `[u32 BE length][payload]` and written
//! to every client; clients that fail a write are pruned. New
//! connections are accepted from `poll`, which the dispatch loop calls
//! once per cycle; the publisher has no thread of its own.

use crate::core::sample::{ImageSample, ImuSample};
use crate::core::time::WireTime;
use crate::error::Result;
use crate::publish::messages::{ImageMessage, ImuMessage, SensorMessage};
use crate::publish::wire::{Serializer, WireFormat};
use crate::publish::SamplePublisher;
use std::io::Write;
use std::net::{TcpListener, TcpStream};

/// TCP publisher broadcasting sensor messages to all connected clients
pub struct TcpPublisher {
    listener: TcpListener,
    clients: Vec<TcpStream>,
    serializer: Serializer,
    /// Reusable frame buffer, avoids an allocation per message
    buffer: Vec<u8>,
}

impl TcpPublisher {
    /// Bind the listener and start with no clients
    pub fn bind(bind_address: &str, format: WireFormat) -> Result<Self> {
        let listener = TcpListener::bind(bind_address)?;
        listener.set_nonblocking(true)?;
        log::info!("Publisher listening on {} ({:?})", bind_address, format);

        Ok(Self {
            listener,
            clients: Vec::new(),
            serializer: Serializer::new(format),
            buffer: Vec::with_capacity(4096),
        })
    }

    /// Number of currently connected clients
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Frame and write one message to every client, pruning the dead
    fn broadcast(&mut self, msg: &SensorMessage) -> Result<()> {
        if self.clients.is_empty() {
            return Ok(());
        }

        let payload = self.serializer.serialize(msg)?;
        self.buffer.clear();
        self.buffer
            .extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.buffer.extend_from_slice(&payload);

        let buffer = &self.buffer;
        self.clients.retain_mut(|client| match client.write_all(buffer) {
            Ok(()) => true,
            Err(e) => {
                if let Ok(addr) = client.peer_addr() {
                    log::info!("Client {} disconnected: {}", addr, e);
                }
                false
            }
        });

        Ok(())
    }
}

impl SamplePublisher for TcpPublisher {
    fn publish_imu(&mut self, stamp: WireTime, sample: &ImuSample) -> Result<()> {
        self.broadcast(&SensorMessage::Imu(ImuMessage::new(stamp, sample)))
    }

    fn publish_image(&mut self, stream_id: &str, stamp: WireTime, sample: &ImageSample) -> Result<()> {
        self.broadcast(&SensorMessage::Image(ImageMessage::new(
            stream_id, stamp, sample,
        )))
    }

    /// Accept any pending connections
    fn poll(&mut self) -> Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    // Writes block; a slow client stalls the cycle, not the producers
                    if let Err(e) = stream.set_nonblocking(false) {
                        log::warn!("Failed to set blocking mode for {}: {}", addr, e);
                        continue;
                    }
                    log::info!("Client connected: {}", addr);
                    self.clients.push(stream);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    break;
                }
            }
        }
        Ok(())
    }
}
