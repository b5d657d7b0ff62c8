use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

pub const BUFFER_SIZE: usize = 4096;
pub const DEFAULT_PORT: u16 = 8096;
pub const THREAD_SLOW_DOWN: Duration = Duration::from_millis(100);

/// Binds the coordinator's listening socket. Without an explicit address the
/// listener is opened on every interface at [`DEFAULT_PORT`].
pub fn get_tcp_listener(address: Option<SocketAddr>) -> io::Result<TcpListener> {
    let address: SocketAddr = address.unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));
    let listener = TcpListener::bind(address)?;
    info!("Listening to connections on {}...", listener.local_addr()?);
    Ok(listener)
}

/// Connects to a peer that may not be listening yet, sleeping
/// [`THREAD_SLOW_DOWN`] between attempts. The last connection error is
/// returned once `attempts` are exhausted.
pub fn connect_with_retry<A: ToSocketAddrs>(address: A, attempts: usize) -> io::Result<TcpStream> {
    let mut last_error = io::Error::new(io::ErrorKind::InvalidInput, "no connection attempts were made");
    for attempt in 1..=attempts {
        match TcpStream::connect(&address) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(err) => {
                debug!("Connection attempt {attempt}/{attempts} failed: {err}");
                last_error = err;
            }
        }
        thread::sleep(THREAD_SLOW_DOWN);
    }
    Err(last_error)
}
