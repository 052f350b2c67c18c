/// Extract the port from a local endpoint token.
///
/// The port is whatever follows the *last* colon, which covers every shape
/// the OS tools print:
/// - IPv4: "127.0.0.1:3000", "0.0.0.0:443", "*:8080"
/// - IPv6: "\[::]:8080", "\[fe80::1%en0]:5353", "\[::ffff:127.0.0.1]:63342"
///
/// Returns `None` when there is no colon, nothing before or after it, or the
/// remainder is not a valid port number.
pub fn parse_port(endpoint: &str) -> Option<u16> {
    let endpoint = endpoint.trim();
    let last_colon = endpoint.rfind(':')?;
    if last_colon == 0 || last_colon + 1 >= endpoint.len() {
        return None;
    }

    endpoint[last_colon + 1..]
        .trim_end_matches(']')
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4_endpoint() {
        assert_eq!(parse_port("0.0.0.0:443"), Some(443));
        assert_eq!(parse_port("127.0.0.1:3000"), Some(3000));
        assert_eq!(parse_port("*:8080"), Some(8080));
    }

    #[test]
    fn test_parse_ipv6_endpoint() {
        assert_eq!(parse_port("[::]:8080"), Some(8080));
        assert_eq!(parse_port("[::1]:6379"), Some(6379));
        assert_eq!(parse_port("[::ffff:127.0.0.1]:63342"), Some(63342));
        assert_eq!(parse_port("[fe80::1%en0]:5353"), Some(5353));
    }

    #[test]
    fn test_parse_invalid_endpoint() {
        assert_eq!(parse_port("invalid"), None);
        assert_eq!(parse_port(""), None);
        assert_eq!(parse_port("127.0.0.1:"), None);
        assert_eq!(parse_port(":80"), None);
        assert_eq!(parse_port("*:*"), None);
        assert_eq!(parse_port("0.0.0.0:70000"), None);
        assert_eq!(parse_port("0.0.0.0:-1"), None);
    }
}
