//! Peer specification parsing.
//!
//! Peers are written as `<peerId>:<address>`, for example
//! `16Uiu2HAm...:/ip4/127.0.0.1/tcp/43101`. Only the first `:` separates the
//! two halves; the address may contain more.

use std::fmt;

use super::file::ConfigFileError;

/// A data peer to connect to during bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSpec {
    pub peer_id: String,
    pub address: String,
}

impl PeerSpec {
    pub fn new(peer_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for PeerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.peer_id, self.address)
    }
}

/// Parse a single `<peerId>:<address>` specification.
pub fn parse_peer(spec: &str) -> Result<PeerSpec, ConfigFileError> {
    let invalid = |reason: &str| ConfigFileError::InvalidValue {
        section: "peer".to_string(),
        key: "peer".to_string(),
        value: spec.to_string(),
        reason: reason.to_string(),
    };

    let (peer_id, address) = spec
        .split_once(':')
        .ok_or_else(|| invalid("expected 'peerId:address'"))?;

    let peer_id = peer_id.trim();
    let address = address.trim();
    if peer_id.is_empty() {
        return Err(invalid("peer id is empty"));
    }
    if address.is_empty() {
        return Err(invalid("address is empty"));
    }

    Ok(PeerSpec::new(peer_id, address))
}

/// Parse a comma-separated list of peer specifications.
///
/// An empty or blank string yields an empty list.
pub fn parse_peers(specs: &str) -> Result<Vec<PeerSpec>, ConfigFileError> {
    if specs.trim().is_empty() {
        return Ok(Vec::new());
    }

    specs.split(',').map(|s| parse_peer(s.trim())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_peer_valid() {
        let peer = parse_peer(
            "16Uiu2HAmGxKj5uXvPvH8yqL5fQJzN3jKd8X9vR2tY1wZ4pL6mN7o:/ip4/194.60.86.122/tcp/4001",
        )
        .unwrap();
        assert_eq!(
            peer.peer_id,
            "16Uiu2HAmGxKj5uXvPvH8yqL5fQJzN3jKd8X9vR2tY1wZ4pL6mN7o"
        );
        assert_eq!(peer.address, "/ip4/194.60.86.122/tcp/4001");
    }

    #[test]
    fn test_parse_peer_no_colon() {
        assert!(parse_peer("invalidpeer").is_err());
    }

    #[test]
    fn test_parse_peer_empty_halves() {
        assert!(parse_peer(":/ip4/1.2.3.4/tcp/1").is_err());
        assert!(parse_peer("peer:").is_err());
    }

    #[test]
    fn test_parse_peers_multiple() {
        let peers =
            parse_peers("peer1:/ip4/192.168.1.1/tcp/4001, peer2:/ip4/192.168.1.2/tcp/4001")
                .unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[1].peer_id, "peer2");
    }

    #[test]
    fn test_parse_peers_empty() {
        assert!(parse_peers("").unwrap().is_empty());
        assert!(parse_peers("   ").unwrap().is_empty());
    }

    #[test]
    fn test_display_round_trip() {
        let peer = PeerSpec::new("abc", "/ip4/127.0.0.1/tcp/43101");
        assert_eq!(parse_peer(&peer.to_string()).unwrap(), peer);
    }
}
