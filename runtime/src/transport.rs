//! The line channel the feeder bus is tunneled through.

use codec::tokio_codec::LinesCodecError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("timed out waiting for a reply line")]
    Timeout,

    #[error("channel closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lines(#[from] LinesCodecError),
}

/// Synchronous request/response over a line-oriented channel.
///
/// `send` submits exactly one line and blocks until one line comes back or the
/// implementation's own deadline passes, which it reports as [`Error::Timeout`].
pub trait Transport {
    fn send(&mut self, line: &str) -> Result<String, Error>;
}

impl<T> Transport for &mut T
where
    T: Transport + ?Sized,
{
    #[inline]
    fn send(&mut self, line: &str) -> Result<String, Error> {
        (**self).send(line)
    }
}

impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    #[inline]
    fn send(&mut self, line: &str) -> Result<String, Error> {
        (**self).send(line)
    }
}
