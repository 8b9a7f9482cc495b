use async_trait::async_trait;
use tokio::{io, net::UdpSocket};

/// Trait abstracting the datagram channel a query runs over.
///
/// The transport layer is generic over this seam so the retry policy
/// can be exercised without a live socket. The only production
/// implementation is a connected [`UdpSocket`].
#[async_trait]
pub(crate) trait DatagramChannel {
    /// Send one datagram to the configured remote endpoint.
    async fn send(&mut self, payload: &[u8]) -> io::Result<()>;

    /// Receive one datagram into `buf`, returning its length.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

#[async_trait]
impl DatagramChannel for UdpSocket {
    async fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        UdpSocket::send(self, payload).await.map(|_| ())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        UdpSocket::recv(self, buf).await
    }
}
