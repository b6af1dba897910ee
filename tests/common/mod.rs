//! Test utilities and mocks for Socksrelay
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use socksrelay::config::ServerConfig;
use socksrelay::server::Socks5Server;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::broadcast;

/// Running proxy; dropping it stops the accept loop
pub struct TestProxy {
    /// Address the proxy accepts clients on
    pub addr: SocketAddr,
    _shutdown: broadcast::Sender<bool>,
}

/// Proxy configuration on ephemeral ports
pub fn test_config() -> ServerConfig {
    ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        grace_period: 1,
        bind_addr: "127.0.0.1:0".to_string(),
        udp_bind_addr: "127.0.0.1:0".to_string(),
        ..Default::default()
    }
}

/// Start a proxy with the given configuration
pub async fn start_proxy(config: ServerConfig) -> TestProxy {
    let server = Socks5Server::new(config);
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        let _ = server.serve(listener, shutdown_rx).await;
    });

    TestProxy {
        addr,
        _shutdown: shutdown_tx,
    }
}

/// TCP server echoing every connection back to itself
pub async fn start_tcp_echo() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut r, mut w) = stream.split();
                let _ = tokio::io::copy(&mut r, &mut w).await;
            });
        }
    });

    addr
}

/// UDP server echoing every datagram to its sender
pub async fn start_udp_echo() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 65535];
        while let Ok((n, from)) = socket.recv_from(&mut buf).await {
            let _ = socket.send_to(&buf[..n], from).await;
        }
    });

    addr
}

/// Connect to a BIND endpoint the way a remote peer would
pub async fn connect_peer(host: &str, port: u16) -> TcpStream {
    TcpStream::connect((host, port)).await.unwrap()
}
