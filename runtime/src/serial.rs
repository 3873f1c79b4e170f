//! [`Transport`] over the motion controller's USB serial port.

use std::time::Duration;

use futures::{
    SinkExt,
    StreamExt,
};
use tokio::runtime::{
    Builder,
    Runtime,
};
use tokio_serial::{
    ClearBuffer,
    SerialPort,
    SerialPortBuilderExt,
    SerialStream,
};

use codec::tokio_codec::{
    Framed,
    LinesCodec,
};

use crate::transport::{
    Error,
    Transport,
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SerialConfig {
    pub port:    String,
    pub baud:    u32,
    /// How long to wait for the controller's reply line.
    pub timeout: Duration,
}

/// Blocking line channel over a serial port.
///
/// Owns a current-thread runtime so that the async serial stream can be driven
/// synchronously, one exchange at a time.
pub struct SerialTransport {
    runtime:    Runtime,
    framed:     Framed<SerialStream, LinesCodec>,
    timeout:    Duration,
    /// The last read failed to decode a line.
    line_error: bool,
}

impl SerialTransport {
    #[tracing::instrument(fields(port = %config.port, baud = config.baud), err(Display))]
    pub fn open(config: &SerialConfig) -> Result<Self, Error> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let stream = {
            let _guard = runtime.enter();

            tokio_serial::new(&config.port, config.baud)
                .timeout(config.timeout)
                .open_native_async()
                .map_err(std::io::Error::from)?
        };

        tracing::info!("connected to serial port");

        Ok(Self::from_parts(runtime, stream, config.timeout))
    }

    /// `stream` must be registered with `runtime`'s reactor.
    fn from_parts(runtime: Runtime, stream: SerialStream, timeout: Duration) -> Self {
        Self {
            runtime,
            framed: Framed::new(stream, LinesCodec::new_with_max_length(codec::MAX_LINE_LENGTH)),
            timeout,
            line_error: false,
        }
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, line: &str) -> Result<String, Error> {
        let Self {
            runtime,
            framed,
            timeout,
            line_error,
        } = self;

        // anything still buffered answers an earlier command
        framed.get_ref().clear(ClearBuffer::Input).map_err(std::io::Error::from)?;
        framed.read_buffer_mut().clear();

        runtime.block_on(async {
            framed.send(line).await?;

            let reply = tokio::time::timeout(*timeout, async {
                loop {
                    match framed.next().await {
                        Some(Ok(line)) if line.trim().is_empty() => continue,
                        Some(Ok(line)) => return Ok(line),

                        Some(Err(e)) => {
                            *line_error = true;
                            return Err(Error::from(e));
                        },

                        // a failed decode ends the stream for exactly one poll
                        None if std::mem::take(line_error) => continue,
                        None => return Err(Error::Closed),
                    }
                }
            })
            .await
            .map_err(|_elapsed| Error::Timeout)??;

            Ok::<_, Error>(reply)
        })
    }
}
