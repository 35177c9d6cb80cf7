//! Validation for user-entered server addresses.

/// Check a `host:port` string typed into the "add server" box.
///
/// The host may be a dotted IP or a domain; the port is 1-5 digits.
pub fn valid_server_address(input: &str) -> bool {
    if !input.contains(':') || !input.contains('.') {
        return false;
    }

    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() != 2 {
        return false;
    }
    let (host, port) = (parts[0], parts[1]);

    if port.is_empty() || port.len() > 5 || !port.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let stripped: Vec<u8> = host.bytes().filter(|&b| b != b'.').collect();
    match stripped.as_slice() {
        [first, middle @ .., last] if !middle.is_empty() => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && middle.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        _ => false,
    }
}

/// Check a dotted-quad IPv4 address. Octets are 1-3 digits up to 255.
pub fn valid_ip(input: &str) -> bool {
    let octets: Vec<&str> = input.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|octet| {
            (1..=3).contains(&octet.len())
                && octet.bytes().all(|b| b.is_ascii_digit())
                && octet.parse::<u16>().is_ok_and(|v| v <= 255)
        })
}
