//! Client IP extraction.

use std::net::IpAddr;

use crate::error::SessionError;

/// Resolve the client IP.
///
/// The first `X-Forwarded-For` entry wins over the transport peer address.
/// A peer address that is not a `host:port` pair is used as-is.
pub(crate) fn remote_host(
    forwarded_for: Option<&str>,
    remote_addr: Option<&str>,
) -> Result<IpAddr, SessionError> {
    let host = match forwarded_for.filter(|f| !f.is_empty()) {
        Some(forwarded) => forwarded.split(',').next().unwrap_or_default().trim(),
        None => {
            let addr = remote_addr.unwrap_or_default();
            split_host(addr).unwrap_or(addr)
        }
    };
    host.parse::<IpAddr>()
        .map_err(|_| SessionError::InvalidIp(host.to_string()))
}

/// Host part of `host:port` or `[host]:port`, `None` when `addr` is not such a pair.
fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        tail.strip_prefix(':')?;
        return Some(host);
    }
    let (host, _port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        // bare IPv6 address, no port
        return None;
    }
    Some(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_forwarded_for_wins() {
        let ip = remote_host(Some("203.0.113.7, 10.0.0.1"), Some("127.0.0.1:4000")).unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)));
    }

    #[test]
    fn test_forwarded_for_single() {
        let ip = remote_host(Some("2001:db8::1"), None).unwrap();
        assert_eq!(ip, "2001:db8::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_forwarded_for_invalid_is_error() {
        let err = remote_host(Some("unknown, 10.0.0.1"), Some("127.0.0.1:4000")).unwrap_err();
        assert_eq!(err, SessionError::InvalidIp("unknown".to_string()));
    }

    #[test]
    fn test_peer_address_with_port() {
        let ip = remote_host(None, Some("192.168.1.20:51234")).unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)));

        let ip = remote_host(Some(""), Some("[::1]:8080")).unwrap();
        assert_eq!(ip, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn test_peer_address_without_port() {
        let ip = remote_host(None, Some("10.1.2.3")).unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)));

        let ip = remote_host(None, Some("::1")).unwrap();
        assert_eq!(ip, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn test_unparsable_peer_is_error() {
        assert!(remote_host(None, Some("localhost:80")).is_err());
        assert!(remote_host(None, Some("pipe")).is_err());
        assert_eq!(
            remote_host(None, None).unwrap_err(),
            SessionError::InvalidIp(String::new())
        );
    }
}
