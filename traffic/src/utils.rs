pub(crate) fn u8s_to_hex_str(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex dump for trace logs, cut short so a large share does not flood them.
pub(crate) fn preview_hex(bytes: &[u8], limit: usize) -> String {
    if bytes.len() <= limit {
        u8s_to_hex_str(bytes)
    } else {
        format!("{} ... (+{} bytes)", u8s_to_hex_str(&bytes[..limit]), bytes.len() - limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!("00 0a ff", u8s_to_hex_str(&[0, 10, 255]));
        assert_eq!("", u8s_to_hex_str(&[]));
    }

    #[test]
    fn test_preview_hex() {
        assert_eq!("01 02", preview_hex(&[1, 2], 2));
        assert_eq!("01 ... (+2 bytes)", preview_hex(&[1, 2, 3], 1));
    }
}
