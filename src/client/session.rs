//! Client session state machine
//!
//! Drives one connection to a proxy through method negotiation and a single
//! command. Once the command is accepted the connection is available as a
//! plain byte stream.
//!
//! States are strictly ordered and never move backwards:
//!
//! ```text
//! PendingAuthMethods(10) → ExpectingAcceptedAuthMethod(20) → PendingAuthentication(30)
//!   → Authenticated(40) → CommandRequested(50) → CommandAccepted(60)
//!
//! Closed(70) / Errored(80) from anywhere
//! ```

use crate::error::{Result, SocksError};
use crate::socks::{
    read_command_response, AddressSpec, AuthMethod, AuthMethodAccept, AuthMethodsOffer,
    CommandRequest, CommandResponse, SocksCommand,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// Client session states, ordered by progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClientState {
    /// Nothing sent yet
    PendingAuthMethods = 10,
    /// Offer sent, waiting for the server's choice
    ExpectingAcceptedAuthMethod = 20,
    /// Server chose a method that needs a sub-negotiation
    PendingAuthentication = 30,
    /// Ready to send a command
    Authenticated = 40,
    /// Command sent, waiting for the response
    CommandRequested = 50,
    /// Command accepted, stream carries application data
    CommandAccepted = 60,
    /// Closed by the caller
    Closed = 70,
    /// A send, receive or decode failed
    Errored = 80,
}

/// SOCKS5 client over any byte stream
#[derive(Debug)]
pub struct Socks5Client<S> {
    stream: Option<S>,
    state: ClientState,
}

impl Socks5Client<TcpStream> {
    /// Open a TCP connection to the proxy at `addr`
    pub async fn dial<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

impl<S> Socks5Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already connected stream
    pub fn new(stream: S) -> Self {
        Socks5Client {
            stream: Some(stream),
            state: ClientState::PendingAuthMethods,
        }
    }

    /// Current state
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Offer `methods` and wait for the server's choice
    ///
    /// Returns the method the server picked. Whatever it picked, the
    /// session ends up `Authenticated`: no method sub-negotiation is run,
    /// so a server that answered "no acceptable methods" will still be sent
    /// the next command.
    pub async fn connect(&mut self, methods: &[AuthMethod]) -> Result<AuthMethod> {
        let mut offer = AuthMethodsOffer::new();
        if let Err(e) = offer.add_all(methods) {
            return Err(self.set_error(e.into()));
        }
        let message = offer.encode()?;

        let sent = self.stream_mut()?.write_all(&message).await;
        self.check(sent)?;
        self.set_state(ClientState::ExpectingAcceptedAuthMethod);

        let mut reply = [0u8; 2];
        let received = self.stream_mut()?.read_exact(&mut reply).await;
        self.check(received)?;

        let accepted = match AuthMethodAccept::decode(&reply) {
            Ok(accepted) => accepted.method(),
            Err(e) => return Err(self.set_error(e.into())),
        };
        debug!("Server selected auth method: {}", accepted);

        if accepted != AuthMethod::NoAuth {
            self.set_state(ClientState::PendingAuthentication);
        }
        self.set_state(ClientState::Authenticated);
        Ok(accepted)
    }

    /// Ask the proxy to connect to `addr:port`
    ///
    /// Returns the endpoint the server reports as bound.
    pub async fn connect_request(&mut self, addr: &str, port: u16) -> Result<(AddressSpec, u16)> {
        self.request(SocksCommand::Connect, addr, port).await
    }

    /// Ask the proxy to accept one inbound connection
    ///
    /// Returns the endpoint the peer should connect to. Once it does, the
    /// server sends a second response; read it with
    /// [`read_bind_notification`](Self::read_bind_notification).
    pub async fn bind_request(&mut self, addr: &str, port: u16) -> Result<(AddressSpec, u16)> {
        self.request(SocksCommand::Bind, addr, port).await
    }

    /// Ask the proxy to relay datagrams
    ///
    /// Returns the UDP endpoint encapsulated datagrams must be sent to.
    pub async fn udp_associate_request(
        &mut self,
        addr: &str,
        port: u16,
    ) -> Result<(AddressSpec, u16)> {
        self.request(SocksCommand::UdpAssociate, addr, port).await
    }

    /// Read the response naming the peer that connected to a BIND endpoint
    pub async fn read_bind_notification(&mut self) -> Result<(AddressSpec, u16)> {
        self.require_accepted()?;
        let read = read_command_response(self.stream_mut()?).await;
        let response = match read {
            Ok(response) => response,
            Err(e) => return Err(self.set_error(e)),
        };
        self.accept_response(response)
    }

    /// Application stream, available once a command was accepted
    pub fn stream(&mut self) -> Result<&mut S> {
        self.require_accepted()?;
        self.stream_mut()
    }

    /// Take the application stream, available once a command was accepted
    pub fn into_stream(mut self) -> Result<S> {
        self.require_accepted()?;
        self.stream
            .take()
            .ok_or_else(|| SocksError::UnexpectedState("connection already released".to_string()))
    }

    /// Close the connection
    ///
    /// An errored session keeps its `Errored` state.
    pub async fn close(&mut self) -> Result<()> {
        if self.state != ClientState::Errored {
            self.set_state(ClientState::Closed);
        }
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }

    async fn request(
        &mut self,
        command: SocksCommand,
        addr: &str,
        port: u16,
    ) -> Result<(AddressSpec, u16)> {
        if self.state != ClientState::Authenticated {
            return Err(SocksError::NotAuthenticated);
        }

        let destination = AddressSpec::parse(addr)?;
        let message = CommandRequest::new(command, destination, port).encode()?;

        let sent = self.stream_mut()?.write_all(&message).await;
        self.check(sent)?;
        self.set_state(ClientState::CommandRequested);

        let read = read_command_response(self.stream_mut()?).await;
        let response = match read {
            Ok(response) => response,
            Err(e) => return Err(self.set_error(e)),
        };
        let bound = self.accept_response(response)?;
        self.set_state(ClientState::CommandAccepted);
        Ok(bound)
    }

    fn accept_response(&mut self, response: CommandResponse) -> Result<(AddressSpec, u16)> {
        if !response.status.is_success() {
            return Err(self.set_error(SocksError::CommandFailed(response.status)));
        }
        debug!("Server bound {}:{}", response.bound, response.port);
        Ok((response.bound, response.port))
    }

    fn require_accepted(&self) -> Result<()> {
        if self.state != ClientState::CommandAccepted {
            return Err(SocksError::UnexpectedState(
                "the server has not accepted any command".to_string(),
            ));
        }
        Ok(())
    }

    fn stream_mut(&mut self) -> Result<&mut S> {
        self.stream
            .as_mut()
            .ok_or_else(|| SocksError::UnexpectedState("connection already released".to_string()))
    }

    fn check<T>(&mut self, result: std::io::Result<T>) -> Result<T> {
        result.map_err(|e| self.set_error(e.into()))
    }

    /// Move to `Errored` and hand the error back for returning
    fn set_error(&mut self, err: SocksError) -> SocksError {
        debug!("Client session errored in {:?}: {}", self.state, err);
        self.state = ClientState::Errored;
        err
    }

    fn set_state(&mut self, next: ClientState) {
        if next < self.state {
            panic!(
                "client session state regression: {:?} -> {:?}",
                self.state, next
            );
        }
        self.state = next;
    }
}
