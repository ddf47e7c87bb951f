// Transport capability: how the session reaches the SMSC. The engine
// only needs an async byte stream, so TLS, SOCKS, or test pipes plug in by
// implementing `Dial`; `TcpDialer` is the plaintext default.

use std::future::Future;
use std::io;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Default SMPP port for plaintext sessions.
pub const DEFAULT_PORT: u16 = 2775;
/// Default SMPP port when the dialer wraps the stream in TLS.
pub const DEFAULT_TLS_PORT: u16 = 2776;

/// Any async byte stream the session can run over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

pub type BoxTransport = Box<dyn Transport>;

type DialFuture<'a> = Pin<Box<dyn Future<Output = io::Result<BoxTransport>> + Send + 'a>>;

/// Connection factory injected through the session config.
pub trait Dial: Send + Sync {
    fn dial<'a>(&'a self, addr: &'a str) -> DialFuture<'a>;
}

/// Plain TCP with Nagle disabled; PDUs are small and latency-sensitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpDialer;

impl Dial for TcpDialer {
    fn dial<'a>(&'a self, addr: &'a str) -> DialFuture<'a> {
        Box::pin(async move {
            let stream = TcpStream::connect(addr).await?;
            stream.set_nodelay(true)?;
            Ok(Box::new(stream) as BoxTransport)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_dialer_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let accept = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut stream = TcpDialer.dial(&addr).await.unwrap();
        stream.write_all(b"ping").await.unwrap();
        stream.flush().await.unwrap();

        assert_eq!(&accept.await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn dial_failure_is_an_io_error() {
        // A listener that is immediately dropped leaves a dead port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(TcpDialer.dial(&addr).await.is_err());
    }
}
