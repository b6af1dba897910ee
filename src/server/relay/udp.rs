//! UDP ASSOCIATE relay
//!
//! Each datagram from the client is forwarded through a freshly bound
//! outbound socket, and exactly one reply is awaited on that socket with no
//! timeout before the next client datagram is read. Only one-shot
//! request/reply exchanges work through this relay.
//!
//! The association lives as long as the client's TCP connection: once that
//! connection reaches EOF or fails, the relay task ends and the socket is
//! released.

use super::Relay;
use crate::error::{Result, SocksError};
use crate::socks::consts::UDP_BUFFER_SIZE;
use crate::socks::splice::{AbortOnDrop, ErrorSink};
use crate::socks::{AddressSpec, ProxyStream, UdpDatagram};
use bytes::Bytes;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::AsyncReadExt;
use tokio::net::UdpSocket;
use tracing::{debug, info, trace, warn};

/// Relay for encapsulated client datagrams
#[derive(Debug)]
pub struct UdpRelay {
    local_ip: IpAddr,
    port: u16,
    socket: Option<UdpSocket>,
    task: Option<AbortOnDrop<()>>,
}

impl UdpRelay {
    /// Bind the client-facing socket on `addr`
    ///
    /// `local_ip` is the address reported to the client alongside the
    /// socket's port.
    pub async fn bind(addr: &str, local_ip: IpAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let port = socket.local_addr()?.port();
        debug!("UDP relay bound on {}", socket.local_addr()?);

        Ok(UdpRelay {
            local_ip,
            port,
            socket: Some(socket),
            task: None,
        })
    }
}

impl Relay for UdpRelay {
    fn bound_address(&self) -> (AddressSpec, u16) {
        (self.local_ip.into(), self.port)
    }

    /// No data flows over the control connection; it is only watched for
    /// the client going away.
    fn start(&mut self, client: Box<dyn ProxyStream>, errors: ErrorSink) {
        let Some(socket) = self.socket.take() else {
            let _ = errors.send(SocksError::UnexpectedState(
                "udp relay already started".to_string(),
            ));
            return;
        };

        info!("UDP ASSOCIATE relay started on port {}", self.port);
        let port = self.port;
        self.task = Some(AbortOnDrop(tokio::spawn(async move {
            tokio::select! {
                _ = relay_loop(socket, errors) => {}
                _ = watch_control(client) => {
                    debug!("UDP association on port {} ended with its control connection", port);
                }
            }
        })));
    }

    fn stop(&mut self) {
        debug!("Stopping UDP relay on port {}", self.port);
        self.task = None;
        self.socket = None;
    }
}

async fn relay_loop(socket: UdpSocket, errors: ErrorSink) {
    let mut buf = vec![0u8; UDP_BUFFER_SIZE];
    let mut reply_buf = vec![0u8; UDP_BUFFER_SIZE];
    loop {
        let (len, client_addr) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!("UDP relay receive failed: {}", e);
                let _ = errors.send(e.into());
                return;
            }
        };

        // A datagram that can't be forwarded is dropped; the association carries on
        let reply = match forward(&buf[..len], &mut reply_buf).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Dropping UDP datagram from {}: {}", client_addr, e);
                continue;
            }
        };

        if let Err(e) = socket.send_to(&reply, client_addr).await {
            warn!("UDP relay send to {} failed: {}", client_addr, e);
            let _ = errors.send(e.into());
            return;
        }
    }
}

/// Resolve once the control connection reaches EOF or fails
async fn watch_control(mut control: Box<dyn ProxyStream>) {
    let mut buf = [0u8; 64];
    loop {
        match control.read(&mut buf).await {
            Ok(0) => return,
            Ok(n) => trace!("Ignoring {} bytes on UDP control connection", n),
            Err(e) => {
                debug!("UDP control connection failed: {}", e);
                return;
            }
        }
    }
}

/// Forward one encapsulated datagram and wait for its single reply
///
/// Returns the reply encapsulated for the client.
async fn forward(datagram: &[u8], reply_buf: &mut [u8]) -> Result<Bytes> {
    let request = UdpDatagram::decode(datagram)?;

    let target = request.destination.resolve(request.port).await?;
    trace!("UDP {} bytes to {}", request.payload.len(), target);

    let outbound = UdpSocket::bind(unspecified_for(&target)).await?;
    outbound.connect(target).await?;
    outbound.send(&request.payload).await?;
    let reply_len = outbound.recv(reply_buf).await?;

    let reply = UdpDatagram {
        fragment: request.fragment,
        destination: request.destination,
        port: request.port,
        payload: Bytes::copy_from_slice(&reply_buf[..reply_len]),
    };
    Ok(reply.encode()?)
}

fn unspecified_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::error_channel;
    use std::time::Duration;
    use tokio::io::duplex;

    async fn udp_echo() -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 2048];
            while let Ok((n, from)) = socket.recv_from(&mut buf).await {
                let _ = socket.send_to(&buf[..n], from).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_udp_relay_round_trip() {
        let echo = udp_echo().await;
        let mut relay = UdpRelay::bind("127.0.0.1:0", IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap();
        let (addr, port) = relay.bound_address();
        assert_eq!(addr.value(), "127.0.0.1");

        let (_control, proxy_side) = duplex(64);
        let (sink, _source) = error_channel();
        relay.start(Box::new(proxy_side), sink);

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let request = UdpDatagram::new(echo.ip().into(), echo.port(), &b"HELLO_RANDOM"[..]);
        client
            .send_to(&request.encode().unwrap(), ("127.0.0.1", port))
            .await
            .unwrap();

        let mut buf = [0u8; 2048];
        let (n, _) = tokio::time::timeout(Duration::from_secs(5), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let reply = UdpDatagram::decode(&buf[..n]).unwrap();
        assert_eq!(reply.payload, &b"HELLO_RANDOM"[..]);
        assert_eq!(reply.destination, request.destination);
        assert_eq!(reply.port, echo.port());

        relay.stop();
    }

    #[tokio::test]
    async fn test_udp_relay_drops_malformed_datagram() {
        let echo = udp_echo().await;
        let mut relay = UdpRelay::bind("127.0.0.1:0", IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap();
        let (_, port) = relay.bound_address();

        let (_control, proxy_side) = duplex(64);
        let (sink, mut source) = error_channel();
        relay.start(Box::new(proxy_side), sink);

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(&[0x00, 0x01, 0x00], ("127.0.0.1", port)).await.unwrap();

        // Name bytes that are not UTF-8
        let mut bad_name = vec![0x00, 0x00, 0x00, 0x03, 4, 0xFF, 0xFE, 0xFD, 0xFC];
        bad_name.extend_from_slice(&echo.port().to_be_bytes());
        client.send_to(&bad_name, ("127.0.0.1", port)).await.unwrap();

        let request = UdpDatagram::new(echo.ip().into(), echo.port(), &b"still here"[..]);
        client
            .send_to(&request.encode().unwrap(), ("127.0.0.1", port))
            .await
            .unwrap();

        let mut buf = [0u8; 2048];
        let (n, _) = tokio::time::timeout(Duration::from_secs(5), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let reply = UdpDatagram::decode(&buf[..n]).unwrap();
        assert_eq!(reply.payload, &b"still here"[..]);
        assert!(source.try_recv().is_err());

        relay.stop();
    }

    #[tokio::test]
    async fn test_udp_relay_ends_with_control_connection() {
        let echo = udp_echo().await;
        let mut relay = UdpRelay::bind("127.0.0.1:0", IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap();
        let (_, port) = relay.bound_address();

        let (control, proxy_side) = duplex(64);
        let (sink, mut source) = error_channel();
        relay.start(Box::new(proxy_side), sink);

        drop(control);

        // The relay finishes quietly, closing the error channel
        let closed = tokio::time::timeout(Duration::from_secs(5), source.recv())
            .await
            .unwrap();
        assert!(closed.is_none());

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let request = UdpDatagram::new(echo.ip().into(), echo.port(), &b"too late"[..]);
        client
            .send_to(&request.encode().unwrap(), ("127.0.0.1", port))
            .await
            .unwrap();

        let mut buf = [0u8; 2048];
        let answered =
            tokio::time::timeout(Duration::from_millis(500), client.recv_from(&mut buf)).await;
        assert!(!matches!(answered, Ok(Ok(_))));

        relay.stop();
    }

    #[test]
    fn test_unspecified_for() {
        let v4: SocketAddr = "10.0.0.1:53".parse().unwrap();
        assert_eq!(unspecified_for(&v4), "0.0.0.0:0".parse::<SocketAddr>().unwrap());
        let v6: SocketAddr = "[::1]:53".parse().unwrap();
        assert_eq!(unspecified_for(&v6), "[::]:0".parse::<SocketAddr>().unwrap());
    }
}
