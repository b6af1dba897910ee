//! Server-side session state machine
//!
//! One session per accepted connection. It negotiates the method, reads a
//! single command, builds the matching relay and hands the connection to it.
//!
//! ```text
//! PendingAuthMethods ──offer/accept──▶ Authenticated ──request/response──▶ Proxying
//! ```
//!
//! States only move forward; going back is a bug and panics.

use super::relay::{build_relay, Relay, RelayContext};
use crate::config::ServerConfig;
use crate::error::{Result, SocksError};
use crate::socks::consts::HANDSHAKE_BUFFER_SIZE;
use crate::socks::{
    error_channel, select_method, AuthMethod, AuthMethodAccept, AuthMethodsOffer,
    CommandRequest, CommandResponse, ProxyStream, StatusCode,
};
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Server session states, ordered by progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServerState {
    /// Waiting for the method offer
    PendingAuthMethods = 10,
    /// Method answered, waiting for a command
    Authenticated = 20,
    /// Connection handed to a relay
    Proxying = 30,
}

/// Per-connection protocol driver
#[derive(Debug)]
pub struct ServerSession<S> {
    stream: S,
    state: ServerState,
    config: Arc<ServerConfig>,
    local_ip: IpAddr,
}

impl<S: ProxyStream + 'static> ServerSession<S> {
    /// Create a session for an accepted connection
    ///
    /// `local_ip` is the server-side address of the connection; UDP
    /// ASSOCIATE reports it back to the client.
    pub fn new(stream: S, config: Arc<ServerConfig>, local_ip: IpAddr) -> Self {
        ServerSession {
            stream,
            state: ServerState::PendingAuthMethods,
            config,
            local_ip,
        }
    }

    /// Current state
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Drive the session until the connection is handed off or torn down
    pub async fn run(mut self) {
        match self.negotiate().await {
            Ok(relay) => {
                self.set_state(ServerState::Proxying);
                self.hand_off(relay);
            }
            Err(e) => self.set_error(e).await,
        }
    }

    async fn negotiate(&mut self) -> Result<Box<dyn Relay>> {
        loop {
            match self.state {
                ServerState::PendingAuthMethods => self.handle_auth().await?,
                ServerState::Authenticated => return self.handle_command().await,
                ServerState::Proxying => {
                    return Err(SocksError::UnexpectedState(
                        "session is already proxying".to_string(),
                    ))
                }
            }
        }
    }

    /// Answer the method offer
    ///
    /// The session moves on to await a command even when nothing acceptable
    /// was offered.
    async fn handle_auth(&mut self) -> Result<()> {
        let message = self.read_message().await?;
        let offer = AuthMethodsOffer::decode(&message)?;
        let method = select_method(&offer);

        debug!("Offered methods {:?}, selected {}", offer.methods(), method);
        self.stream
            .write_all(&AuthMethodAccept::new(method).encode())
            .await?;

        if method == AuthMethod::NoAcceptableMethods {
            warn!("No acceptable auth method offered; still awaiting a command");
        }

        self.set_state(ServerState::Authenticated);
        Ok(())
    }

    /// Read the command, build its relay and report the bound endpoint
    async fn handle_command(&mut self) -> Result<Box<dyn Relay>> {
        let message = self.read_message().await?;
        let request = CommandRequest::decode(&message)?;
        info!("SOCKS5 request: {}", request);

        let ctx = RelayContext::new(&self.config, self.local_ip);
        let relay = build_relay(&request, &ctx).await?;

        let (bound, port) = relay.bound_address();
        let response = CommandResponse::success(bound, port);
        self.stream.write_all(&response.encode()?).await?;
        self.stream.flush().await?;

        Ok(relay)
    }

    /// Start the relay on the connection and watch it for its first failure
    fn hand_off(self, mut relay: Box<dyn Relay>) {
        let (sink, mut source) = error_channel();
        relay.start(Box::new(self.stream), sink);

        tokio::spawn(async move {
            match source.recv().await {
                Some(e) => warn!("Relay failed: {}", e),
                None => debug!("Relay finished"),
            }
            relay.stop();
        });
    }

    /// Tell the client about a failure and close the connection
    async fn set_error(mut self, err: SocksError) {
        warn!("Session failed in state {:?}: {}", self.state, err);

        match self.state {
            ServerState::PendingAuthMethods => {
                let reply = AuthMethodAccept::new(AuthMethod::NoAcceptableMethods).encode();
                let _ = self.stream.write_all(&reply).await;
                let _ = self.stream.shutdown().await;
            }
            ServerState::Authenticated => {
                if let Ok(reply) = CommandResponse::failure(StatusCode::ServerFailure).encode() {
                    let _ = self.stream.write_all(&reply).await;
                }
                let grace = self.config.grace_period();
                close_after_grace(self.stream, grace).await;
            }
            // The relay owns the connection by now and closes it on stop
            ServerState::Proxying => {}
        }
    }

    /// One read of whatever the client has sent so far
    async fn read_message(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; HANDSHAKE_BUFFER_SIZE];
        let n = self.stream.read(&mut buf).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "client closed the connection",
            )
            .into());
        }
        buf.truncate(n);
        Ok(buf)
    }

    fn set_state(&mut self, next: ServerState) {
        if next < self.state {
            panic!(
                "server session state regression: {:?} -> {:?}",
                self.state, next
            );
        }
        debug!("Server session {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Let pending writes drain, closing once the client hangs up or `grace` elapses
async fn close_after_grace<S: ProxyStream>(mut stream: S, grace: Duration) {
    let mut sink = [0u8; 256];
    let drained = tokio::time::timeout(grace, async {
        while let Ok(n) = stream.read(&mut sink).await {
            if n == 0 {
                break;
            }
        }
    })
    .await;

    if drained.is_err() {
        debug!("Grace period elapsed, closing connection");
    }
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::{read_command_response, AddressSpec, SocksCommand};
    use std::net::Ipv4Addr;
    use tokio::io::{duplex, DuplexStream};
    use tokio::net::TcpListener;

    fn test_config() -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            grace_period: 1,
            bind_addr: "127.0.0.1:0".to_string(),
            udp_bind_addr: "127.0.0.1:0".to_string(),
            ..Default::default()
        })
    }

    fn spawn_session() -> DuplexStream {
        let (client, server) = duplex(4096);
        let session = ServerSession::new(
            server,
            test_config(),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        );
        tokio::spawn(session.run());
        client
    }

    async fn echo_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let (mut r, mut w) = stream.split();
            let _ = tokio::io::copy(&mut r, &mut w).await;
        });
        port
    }

    async fn offer(client: &mut DuplexStream, methods: &[u8]) -> [u8; 2] {
        let mut msg = vec![0x05, methods.len() as u8];
        msg.extend_from_slice(methods);
        client.write_all(&msg).await.unwrap();
        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        reply
    }

    #[tokio::test]
    async fn test_session_connect_echo() {
        let port = echo_server().await;
        let mut client = spawn_session();

        assert_eq!(offer(&mut client, &[0x00]).await, [0x05, 0x00]);

        let request = CommandRequest::new(
            SocksCommand::Connect,
            AddressSpec::ipv4(Ipv4Addr::LOCALHOST),
            port,
        );
        client.write_all(&request.encode().unwrap()).await.unwrap();

        let response = read_command_response(&mut client).await.unwrap();
        assert_eq!(response.status, StatusCode::Success);
        assert_eq!(response.bound, AddressSpec::unspecified());
        assert_eq!(response.port, 0);

        client.write_all(b"Hello").await.unwrap();
        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"Hello");
    }

    #[tokio::test]
    async fn test_session_proceeds_after_no_acceptable_method() {
        let port = echo_server().await;
        let mut client = spawn_session();

        assert_eq!(offer(&mut client, &[0x02]).await, [0x05, 0xFF]);

        let request = CommandRequest::new(
            SocksCommand::Connect,
            AddressSpec::ipv4(Ipv4Addr::LOCALHOST),
            port,
        );
        client.write_all(&request.encode().unwrap()).await.unwrap();

        let response = read_command_response(&mut client).await.unwrap();
        assert_eq!(response.status, StatusCode::Success);
    }

    #[tokio::test]
    async fn test_session_malformed_offer_rejected_and_closed() {
        let mut client = spawn_session();
        client.write_all(&[0x04, 0x01, 0x00]).await.unwrap();

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, vec![0x05, 0xFF]);
    }

    #[tokio::test]
    async fn test_session_bad_command_gets_server_failure() {
        let mut client = spawn_session();
        assert_eq!(offer(&mut client, &[0x00]).await, [0x05, 0x00]);

        client
            .write_all(&[0x05, 0x09, 0x00, 0x01, 127, 0, 0, 1, 0, 80])
            .await
            .unwrap();

        let response = read_command_response(&mut client).await.unwrap();
        assert_eq!(response.status, StatusCode::ServerFailure);
        assert_eq!(response.bound, AddressSpec::unspecified());

        // closed once the grace period runs out
        let mut rest = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_session_bind_reports_listener() {
        let mut client = spawn_session();
        assert_eq!(offer(&mut client, &[0x00]).await, [0x05, 0x00]);

        let request = CommandRequest::new(SocksCommand::Bind, AddressSpec::unspecified(), 0);
        client.write_all(&request.encode().unwrap()).await.unwrap();

        let response = read_command_response(&mut client).await.unwrap();
        assert_eq!(response.status, StatusCode::Success);
        assert_eq!(response.bound.value(), "127.0.0.1");
        assert_ne!(response.port, 0);
    }

    #[tokio::test]
    async fn test_session_udp_reports_local_ip() {
        let mut client = spawn_session();
        assert_eq!(offer(&mut client, &[0x00]).await, [0x05, 0x00]);

        let request =
            CommandRequest::new(SocksCommand::UdpAssociate, AddressSpec::unspecified(), 0);
        client.write_all(&request.encode().unwrap()).await.unwrap();

        let response = read_command_response(&mut client).await.unwrap();
        assert_eq!(response.status, StatusCode::Success);
        assert_eq!(response.bound.value(), "127.0.0.1");
        assert_ne!(response.port, 0);
    }

    #[test]
    fn test_state_order() {
        assert!(ServerState::PendingAuthMethods < ServerState::Authenticated);
        assert!(ServerState::Authenticated < ServerState::Proxying);
        assert_eq!(ServerState::Proxying as u8, 30);
    }

    #[tokio::test]
    #[should_panic(expected = "state regression")]
    async fn test_state_regression_panics() {
        let (_client, server) = duplex(64);
        let mut session =
            ServerSession::new(server, test_config(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        session.set_state(ServerState::Authenticated);
        assert_eq!(session.state(), ServerState::Authenticated);
        session.set_state(ServerState::PendingAuthMethods);
    }
}
