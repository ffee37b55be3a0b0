//! Socket transport for the device session.
//!
//! Wraps the connected stream in a uniform [`Connection`] type so the rest
//! of the session logic stays transport agnostic. The connection is opened
//! once, has its read/write timeouts installed before the first command,
//! and is closed when the owning session is dropped.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use shutter_config::SocketEndpoint;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use crate::errors::SessionError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
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

/// Connects to the device endpoint and installs the per-operation timeouts.
pub(crate) fn connect(
    endpoint: &SocketEndpoint,
    io_timeout: Duration,
) -> Result<Connection, SessionError> {
    let connection = match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let endpoint_display = endpoint.to_string();
            let address = resolve_tcp_address(host, *port).map_err(|source| {
                SessionError::Resolve {
                    endpoint: endpoint_display.clone(),
                    source,
                }
            })?;
            TcpStream::connect_timeout(&address, CONNECT_TIMEOUT)
                .map(Connection::Tcp)
                .map_err(|source| SessionError::Connect {
                    endpoint: endpoint_display,
                    source,
                })?
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str()).map_err(|source| SessionError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })?
            }

            #[cfg(not(unix))]
            {
                return Err(SessionError::UnsupportedUnixTransport(endpoint.to_string()));
            }
        }
    };

    install_timeouts(&connection, io_timeout).map_err(SessionError::Configure)?;
    Ok(connection)
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, CONNECT_TIMEOUT)?;
    let stream = UnixStream::from(std::os::fd::OwnedFd::from(socket));
    Ok(Connection::Unix(stream))
}

fn install_timeouts(connection: &Connection, io_timeout: Duration) -> io::Result<()> {
    match connection {
        Connection::Tcp(stream) => {
            stream.set_read_timeout(Some(io_timeout))?;
            stream.set_write_timeout(Some(io_timeout))
        }
        #[cfg(unix)]
        Connection::Unix(stream) => {
            stream.set_read_timeout(Some(io_timeout))?;
            stream.set_write_timeout(Some(io_timeout))
        }
    }
}
