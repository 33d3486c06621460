//! Byte-stream transport
//!
//! Works over a serial device node, configured raw 8N1 at the chosen baud
//! rate when opened, or over a serial-over-TCP bridge such as ser2net.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use doorlink_core::constants::DEFAULT_BAUD_RATE;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Prefix selecting the TCP bridge in [`StreamTransport::from_port`]
pub const TCP_SCHEME: &str = "tcp://";

const READ_CHUNK: usize = 256;

/// Any bidirectional byte stream the link can run over
pub trait LinkStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> LinkStream for T {}

#[derive(Debug, Clone)]
enum Endpoint {
    Serial(PathBuf),
    Tcp(String),
    Attached(String),
}

/// Line transport over a byte stream
pub struct StreamTransport {
    endpoint: Endpoint,
    stream: Option<Box<dyn LinkStream>>,
    buffer: BytesMut,
    connect_timeout: Duration,
    baud_rate: u32,
}

impl StreamTransport {
    /// Serial device node, e.g. `/dev/ttyUSB0`
    pub fn serial(path: impl Into<PathBuf>) -> Self {
        Self::with_endpoint(Endpoint::Serial(path.into()))
    }

    /// Serial-over-TCP bridge, `host:port`
    pub fn tcp(addr: impl Into<String>) -> Self {
        Self::with_endpoint(Endpoint::Tcp(addr.into()))
    }

    /// Pick the endpoint from a port argument
    ///
    /// `tcp://host:port` selects the TCP bridge, anything else is a device
    /// node path.
    pub fn from_port(port: &str) -> Self {
        match port.strip_prefix(TCP_SCHEME) {
            Some(addr) => Self::tcp(addr),
            None => Self::serial(port),
        }
    }

    /// Wrap an already-open stream
    pub fn from_stream(stream: impl LinkStream + 'static, name: impl Into<String>) -> Self {
        let mut transport = Self::with_endpoint(Endpoint::Attached(name.into()));
        transport.stream = Some(Box::new(stream));
        transport
    }

    /// Set the line speed (serial node only)
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set connection timeout (TCP bridge only)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn with_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            stream: None,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            connect_timeout: Duration::from_secs(5),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    fn open_serial(&self, path: &Path) -> Result<SerialStream> {
        let node = path
            .to_str()
            .ok_or_else(|| Error::InvalidAddress(path.display().to_string()))?;

        let port = tokio_serial::new(node, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()?;

        debug!("{} configured at {} baud", node, self.baud_rate);
        Ok(port)
    }

    /// Read whatever is ready right now into the buffer
    async fn fill_ready(&mut self) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        self.buffer.reserve(READ_CHUNK);

        // A zero timeout still polls the read once.
        let result = timeout(Duration::ZERO, stream.read_buf(&mut self.buffer)).await;
        match result {
            Ok(Ok(0)) => Err(Error::ConnectionClosed),
            Ok(Ok(n)) => {
                trace!("Buffered {} bytes", n);
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl Transport for StreamTransport {
    async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyConnected);
        }

        debug!("Opening {}...", self.describe());

        let stream: Box<dyn LinkStream> = match &self.endpoint {
            Endpoint::Serial(path) => Box::new(self.open_serial(path)?),
            Endpoint::Tcp(addr) => {
                let stream = timeout(self.connect_timeout, TcpStream::connect(addr.as_str()))
                    .await
                    .map_err(|_| Error::ConnectionTimeout)?
                    .map_err(Error::Io)?;

                // Disable Nagle's algorithm for low latency
                stream.set_nodelay(true)?;
                Box::new(stream)
            }
            Endpoint::Attached(name) => {
                return Err(Error::InvalidAddress(format!("{} cannot be reopened", name)));
            }
        };

        debug!("Opened {}", self.describe());

        self.buffer.clear();
        self.stream = Some(stream);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing {}...", self.describe());

            // Graceful shutdown
            let _ = stream.shutdown().await;
        }

        self.buffer.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {:?}", data.len(), String::from_utf8_lossy(data));

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<BytesMut> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line = self.buffer.split_to(pos + 1);
                trace!("Received line: {:?}", String::from_utf8_lossy(&line));
                return Ok(line);
            }

            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
            self.buffer.reserve(READ_CHUNK);

            let result = timeout_at(deadline, stream.read_buf(&mut self.buffer)).await;
            match result {
                Ok(Ok(0)) => return Err(Error::ConnectionClosed),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(Error::Io(e)),
                Err(_) if self.buffer.is_empty() => {
                    warn!("Read timeout after {:?}", timeout);
                    return Err(Error::ReadTimeout);
                }
                Err(_) => {
                    let partial = self.buffer.split();
                    warn!("Read timeout with partial line: {:?}", String::from_utf8_lossy(&partial));
                    return Ok(partial);
                }
            }
        }
    }

    async fn bytes_available(&mut self) -> Result<usize> {
        self.fill_ready().await?;
        Ok(self.buffer.len())
    }

    async fn discard_input(&mut self) -> Result<usize> {
        let mut discarded = 0;
        loop {
            let available = self.bytes_available().await?;
            if available == 0 {
                break;
            }
            discarded += available;
            self.buffer.clear();
        }

        if discarded > 0 {
            trace!("Discarded {} bytes", discarded);
        }
        Ok(discarded)
    }

    fn describe(&self) -> String {
        match &self.endpoint {
            Endpoint::Serial(path) => path.display().to_string(),
            Endpoint::Tcp(addr) => format!("{}{}", TCP_SCHEME, addr),
            Endpoint::Attached(name) => name.clone(),
        }
    }
}

impl Drop for StreamTransport {
    fn drop(&mut self) {
        if self.is_open() && !matches!(self.endpoint, Endpoint::Attached(_)) {
            warn!("Transport {} dropped while still open", self.describe());
        }
    }
}
