//! Single request/reply exchanges over accepted connections.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use tracing::{debug, warn};

use super::TRANSPORT_TARGET;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Stream types accepted by the transport loop.
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Turns one raw request into one raw reply.
pub trait MessageHandler: Send + Sync {
    /// Produces the reply bytes for `request`. Implementations must not fail.
    fn handle_message(&self, request: &[u8]) -> Vec<u8>;
}

/// Reads one request, hands it to `handler`, and writes the reply back.
///
/// Receive failures are logged and the connection is dropped without a
/// reply. Send failures are logged.
pub(crate) fn serve_connection<S>(stream: &mut S, handler: &dyn MessageHandler)
where
    S: Read + Write,
{
    let request = match read_request_line(stream) {
        Ok(Some(request)) => request,
        Ok(None) => {
            debug!(
                target: TRANSPORT_TARGET,
                "connection closed before a request arrived"
            );
            return;
        }
        Err(error) => {
            warn!(
                target: TRANSPORT_TARGET,
                error = %error,
                "failed to receive request"
            );
            return;
        }
    };

    let reply = handler.handle_message(&request);
    if let Err(error) = stream.write_all(&reply).and_then(|()| stream.flush()) {
        warn!(
            target: TRANSPORT_TARGET,
            error = %error,
            reply_bytes = reply.len(),
            "failed to send reply"
        );
    }
}

fn read_request_line<S: Read>(stream: &mut S) -> io::Result<Option<Vec<u8>>> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let bytes_read = read_chunk_with_retry(stream, &mut chunk)?;
        if bytes_read == 0 {
            return Ok((!buffer.is_empty()).then_some(buffer));
        }

        let received = &chunk[..bytes_read];
        if let Some(pos) = received.iter().position(|byte| *byte == b'\n') {
            buffer.extend_from_slice(&received[..=pos]);
            enforce_request_limit(buffer.len())?;
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(received);
        enforce_request_limit(buffer.len())?;
    }
}

fn read_chunk_with_retry<S: Read>(stream: &mut S, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

fn enforce_request_limit(size: usize) -> io::Result<()> {
    if size > MAX_REQUEST_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "request exceeds maximum size",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    struct EchoHandler;

    impl MessageHandler for EchoHandler {
        fn handle_message(&self, request: &[u8]) -> Vec<u8> {
            request.to_vec()
        }
    }

    /// In-memory stream recording everything written to it.
    struct ScriptedStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
        interrupts: usize,
    }

    impl ScriptedStream {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
                interrupts: 0,
            }
        }

        fn interrupted(input: &[u8], interrupts: usize) -> Self {
            Self {
                interrupts,
                ..Self::new(input)
            }
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupts > 0 {
                self.interrupts -= 1;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.input.read(buf)
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    #[case::newline_terminated(ScriptedStream::new(b"ping\nignored"), b"ping\n".as_slice())]
    #[case::eof_terminated(ScriptedStream::new(b"ping"), b"ping".as_slice())]
    #[case::interrupted(ScriptedStream::interrupted(b"ping\n", 3), b"ping\n".as_slice())]
    fn replies_on_the_same_stream(#[case] mut stream: ScriptedStream, #[case] expected: &[u8]) {
        serve_connection(&mut stream, &EchoHandler);
        assert_eq!(stream.output, expected);
    }

    #[test]
    fn closed_connection_gets_no_reply() {
        let mut stream = ScriptedStream::new(b"");
        serve_connection(&mut stream, &EchoHandler);
        assert!(stream.output.is_empty());
    }

    #[test]
    fn oversized_request_is_dropped_without_reply() {
        let mut stream = ScriptedStream::new(&vec![b'x'; MAX_REQUEST_BYTES + 1]);
        serve_connection(&mut stream, &EchoHandler);
        assert!(stream.output.is_empty());
    }

    #[test]
    fn read_request_line_rejects_oversized_lines() {
        let mut stream = ScriptedStream::new(&vec![b'x'; MAX_REQUEST_BYTES + 10]);
        let error = read_request_line(&mut stream).expect_err("request should be too large");
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }
}
