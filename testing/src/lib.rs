use std::net::{TcpListener, TcpStream};

/// Same capacity as the traffic wire format's timestamp buffer.
const TIMESTAMP_CAPACITY: usize = 20;

pub fn listen_on_available_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("Could not bind an integration listener.");
    let port = listener.local_addr().expect("Listener has no local address.").port();
    (listener, port)
}

pub fn connect(port: u16) -> TcpStream {
    TcpStream::connect(("127.0.0.1", port)).expect("Could not connect to integration server.")
}

pub fn u8s_to_hex_str(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn hex_str_to_u8s(hex: &str) -> Result<Vec<u8>, ()> {
    let stripped = hex
        .chars()
        .filter(char::is_ascii_hexdigit)
        .collect::<Vec<char>>();
    if stripped.len() % 2 != 0 {
        return Err(());
    }
    stripped
        .chunks(2)
        .map(|double_hex| double_hex.iter().collect::<String>())
        .map(|hex_string| u8::from_str_radix(&hex_string, 16).map_err(|_| ()))
        .collect::<Result<Vec<_>, ()>>()
}

/// Hex for one reading in wire layout: NUL-padded timestamp then two
/// big-endian 32-bit integers.
pub fn record_hex(timestamp: &str, sensor: i32, vehicles: i32) -> String {
    let mut bytes = [0u8; TIMESTAMP_CAPACITY];
    let length = timestamp.len().min(TIMESTAMP_CAPACITY - 1);
    bytes[..length].copy_from_slice(&timestamp.as_bytes()[..length]);
    let mut record = bytes.to_vec();
    record.extend_from_slice(&sensor.to_be_bytes());
    record.extend_from_slice(&vehicles.to_be_bytes());
    u8s_to_hex_str(&record)
}

#[macro_export]
macro_rules! send_bytes_from {
    ($s:expr, $h:expr) => {{
        use std::io::Write;
        _ = $s.write_all(
            &$crate::hex_str_to_u8s($h).expect("Invalid hex code provided for integration test."),
        );
    }};
}

#[macro_export]
macro_rules! assert_client_receives_bytes (
    ($s:expr, $h:expr, $d:expr) => {{
        use std::io::Read;

        let client = &mut $s;
        let bytes = $crate::hex_str_to_u8s($h).expect("Invalid hex code provided for integration test.");
        let mut buffer: Vec<u8> = Vec::new();
        client.set_read_timeout(Some($d)).expect("Could not set read timeout.");
        match (&mut *client).take(bytes.len() as u64).read_to_end(&mut buffer) {
            Err(e)  => panic!("Client connection errored: {e:?}"),
            Ok(_) => assert_eq!($crate::u8s_to_hex_str(&bytes), $crate::u8s_to_hex_str(&buffer)),
        };
        client.set_read_timeout(None).expect("Could not unset read timeout.");
    }};
    ($s:expr, $h:expr) => {{
        $crate::assert_client_receives_bytes!($s, $h, std::time::Duration::from_secs(1))
    }};
);

/// Asserts the peer closed its end: the next read returns no bytes.
#[macro_export]
macro_rules! assert_client_closed (
    ($s:expr, $d:expr) => {{
        use std::io::Read;

        let client = &mut $s;
        let mut buffer = [0u8; 1];
        client.set_read_timeout(Some($d)).expect("Could not set read timeout.");
        match client.read(&mut buffer) {
            Ok(0) => (),
            Ok(_) => panic!("Client received unexpected bytes."),
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => (),
            Err(e) => panic!("Client connection errored: {e:?}"),
        };
    }};
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        assert_eq!(Ok(vec![0x80, 0x00, 0x0a]), hex_str_to_u8s("80 00 0A"));
        assert_eq!("80 00 0a", u8s_to_hex_str(&[0x80, 0x00, 0x0a]));
        assert_eq!(Err(()), hex_str_to_u8s("800"));
    }

    #[test]
    fn record_layout() {
        assert_eq!(
            "30 38 3a 30 30 3a 30 30 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 01 00 00 00 05",
            record_hex("08:00:00", 1, 5)
        );
        assert_eq!(28 * 3 - 1, record_hex("2024-01-01T08:00:00.000", -1, 0).len());
    }
}
