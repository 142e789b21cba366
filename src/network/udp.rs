//! UDP voice sink
//!
//! Each frame becomes one datagram to the configured target, paced at the
//! frame duration so the receiver gets audio in real time.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::SinkConfig;
use crate::constants::MAX_PACKET_SIZE;
use crate::error::SinkError;
use crate::network::protocol::{flags, FrameHeader, HEADER_SIZE};
use crate::player::sink::{VoiceConnection, VoiceGateway};
use crate::tracks::Destination;

/// Opens UDP connections to the configured target
pub struct UdpGateway {
    config: SinkConfig,
}

impl UdpGateway {
    pub fn new(config: SinkConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl VoiceGateway for UdpGateway {
    async fn connect(&self, destination: &Destination) -> Result<Box<dyn VoiceConnection>, SinkError> {
        let connection = UdpVoiceConnection::connect(&self.config, destination).await?;
        info!(%destination, target = %self.config.target, "Voice connection opened");
        Ok(Box::new(connection))
    }
}

/// One open voice connection
pub struct UdpVoiceConnection {
    socket: UdpSocket,
    stream_id: u32,
    sequence: u16,
    timestamp: u32,
    samples_per_frame: u32,
    speaking: bool,
    pacer: Interval,
    frames_sent: u64,
}

impl UdpVoiceConnection {
    pub async fn connect(config: &SinkConfig, destination: &Destination) -> Result<Self, SinkError> {
        let local: SocketAddr = if config.target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| SinkError::ConnectionFailed(e.to_string()))?;
        socket
            .connect(config.target)
            .await
            .map_err(|e| SinkError::ConnectionFailed(e.to_string()))?;

        let mut pacer = interval(config.frame_duration());
        pacer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self {
            socket,
            stream_id: stream_id(destination),
            sequence: 0,
            timestamp: 0,
            samples_per_frame: config.samples_per_frame(),
            speaking: false,
            pacer,
            frames_sent: 0,
        })
    }

    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    fn header(&self) -> FrameHeader {
        FrameHeader {
            flags: if self.speaking { flags::SPEAKING } else { 0 },
            sequence: self.sequence,
            timestamp: self.timestamp,
            stream_id: self.stream_id,
        }
    }

    async fn send_datagram(&self, payload: &[u8]) -> Result<(), SinkError> {
        let datagram = self.header().encode(payload);
        self.socket
            .send(&datagram)
            .await
            .map_err(|e| SinkError::SendFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl VoiceConnection for UdpVoiceConnection {
    async fn start_speaking(&mut self) -> Result<(), SinkError> {
        self.speaking = true;
        self.pacer.reset();
        self.send_datagram(&[]).await
    }

    async fn stop_speaking(&mut self) -> Result<(), SinkError> {
        self.speaking = false;
        self.send_datagram(&[]).await
    }

    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        if frame.len() + HEADER_SIZE > MAX_PACKET_SIZE {
            return Err(SinkError::SendFailed(format!("frame of {} bytes does not fit a datagram", frame.len())));
        }
        self.pacer.tick().await;
        self.send_datagram(frame).await?;
        self.sequence = self.sequence.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(self.samples_per_frame);
        self.frames_sent += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SinkError> {
        if self.speaking {
            self.stop_speaking().await?;
        }
        debug!(stream_id = self.stream_id, frames = self.frames_sent, "Voice connection closed");
        Ok(())
    }
}

fn stream_id(destination: &Destination) -> u32 {
    let mut hasher = DefaultHasher::new();
    destination.hash(&mut hasher);
    hasher.finish() as u32
}
