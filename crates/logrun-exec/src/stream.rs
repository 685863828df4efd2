//! Standard stream configuration shared by the executors

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// An async reader that several invocations may consume in turn
pub type SharedReader = Arc<Mutex<Box<dyn AsyncRead + Send + Unpin>>>;

/// An async writer that several invocations (or both output streams of one
/// invocation) may write to
pub type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

const CHUNK_SIZE: usize = 8192;

/// Where a command's standard input comes from
#[derive(Clone, Default)]
pub enum InputSource {
    /// Read from the null device
    #[default]
    Null,
    /// Feed these bytes to every invocation
    Bytes(Vec<u8>),
    /// Copy from a shared reader until EOF
    Reader(SharedReader),
}

impl InputSource {
    /// Wrap an async reader
    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        InputSource::Reader(Arc::new(Mutex::new(Box::new(reader))))
    }

    /// Whether nothing is fed to the process
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, InputSource::Null)
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Null => f.write_str("Null"),
            InputSource::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            InputSource::Reader(_) => f.write_str("Reader"),
        }
    }
}

/// Where a command's standard output or error goes
#[derive(Clone, Default)]
pub enum OutputSink {
    /// Capture into the returned [`CommandResult`](crate::result::CommandResult)
    #[default]
    Capture,
    /// Discard
    Null,
    /// Write to this process's own stdout/stderr
    Inherit,
    /// Copy into a shared writer
    Writer(SharedWriter),
}

impl OutputSink {
    /// Wrap an async writer
    pub fn writer(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        OutputSink::Writer(Arc::new(Mutex::new(Box::new(writer))))
    }

    /// Whether output ends up in the returned result
    #[must_use]
    pub fn captures(&self) -> bool {
        matches!(self, OutputSink::Capture)
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Capture => f.write_str("Capture"),
            OutputSink::Null => f.write_str("Null"),
            OutputSink::Inherit => f.write_str("Inherit"),
            OutputSink::Writer(_) => f.write_str("Writer"),
        }
    }
}

/// Which of the two output streams a chunk belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StdStream {
    Stdout,
    Stderr,
}

/// Hand one chunk of output to `sink`, appending to `captured` if capturing
pub(crate) async fn deliver(
    sink: &OutputSink,
    stream: StdStream,
    captured: &mut Vec<u8>,
    data: &[u8],
) -> io::Result<()> {
    match sink {
        OutputSink::Capture => captured.extend_from_slice(data),
        OutputSink::Null => {}
        OutputSink::Inherit => match stream {
            StdStream::Stdout => tokio::io::stdout().write_all(data).await?,
            StdStream::Stderr => tokio::io::stderr().write_all(data).await?,
        },
        // the lock is held per chunk so stdout and stderr may share a writer
        OutputSink::Writer(w) => w.lock().await.write_all(data).await?,
    }
    Ok(())
}

/// Flush whatever `sink` buffers once a stream reached EOF
pub(crate) async fn finish(sink: &OutputSink, stream: StdStream) -> io::Result<()> {
    match sink {
        OutputSink::Capture | OutputSink::Null => Ok(()),
        OutputSink::Inherit => match stream {
            StdStream::Stdout => tokio::io::stdout().flush().await,
            StdStream::Stderr => tokio::io::stderr().flush().await,
        },
        OutputSink::Writer(w) => w.lock().await.flush().await,
    }
}

/// Copy `src` into `sink` until EOF, returning the captured bytes
pub(crate) async fn pump<R>(mut src: R, sink: &OutputSink, stream: StdStream) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = src.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        deliver(sink, stream, &mut captured, &buf[..n]).await?;
    }
    finish(sink, stream).await?;
    Ok(captured)
}

/// Copy `source` into a process's stdin, then close it
///
/// A process that exits without reading all of its input is not an error.
pub(crate) async fn feed<W>(source: &InputSource, mut dst: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let result = match source {
        InputSource::Null => Ok(()),
        InputSource::Bytes(bytes) => dst.write_all(bytes).await,
        InputSource::Reader(r) => {
            let mut reader = r.lock().await;
            tokio::io::copy(&mut *reader, &mut dst).await.map(|_| ())
        }
    };
    let result = match result {
        Ok(()) => dst.shutdown().await,
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Bytes to text, replacing invalid UTF-8
pub(crate) fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pump_capture() {
        let data: &[u8] = b"hello\nworld\n";
        let out = pump(data, &OutputSink::Capture, StdStream::Stdout)
            .await
            .unwrap();
        assert_eq!(out, b"hello\nworld\n");
    }

    #[tokio::test]
    async fn test_pump_null_discards() {
        let data: &[u8] = b"ignored";
        let out = pump(data, &OutputSink::Null, StdStream::Stderr)
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_pump_writer() {
        let (client, mut server) = tokio::io::duplex(64);
        let sink = OutputSink::writer(client);
        let data: &[u8] = b"to the writer";

        let out = pump(data, &sink, StdStream::Stdout).await.unwrap();
        assert!(out.is_empty());
        drop(sink);

        let mut received = Vec::new();
        server.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"to the writer");
    }

    #[tokio::test]
    async fn test_feed_bytes() {
        let (client, mut server) = tokio::io::duplex(64);
        feed(&InputSource::Bytes(b"input".to_vec()), client)
            .await
            .unwrap();

        let mut received = Vec::new();
        server.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"input");
    }

    #[test]
    fn test_defaults() {
        assert!(InputSource::default().is_null());
        assert!(OutputSink::default().captures());
        assert!(!OutputSink::Null.captures());
    }
}
