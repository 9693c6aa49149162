// src/probe.rs
//
// Source A2S query client. Each endpoint is queried independently with its
// own socket and bounded timeout; `probe` maps every failure to a Down
// status so one unreachable server can never fail a cycle.
use std::fmt;
use std::io::Cursor;
use std::time::{Duration, Instant};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use serde::Serialize;
use tokio::net::UdpSocket;

use crate::models::server::{ServerEndpoint, ServerState, ServerStatus};

const PACKET_HEADER: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
const A2S_INFO: u8 = 0x54;
const A2S_INFO_REPLY: u8 = 0x49;
const A2S_PLAYER: u8 = 0x55;
const A2S_PLAYER_REPLY: u8 = 0x44;
const A2S_CHALLENGE_REPLY: u8 = 0x41;
const INFO_PAYLOAD: &[u8] = b"Source Engine Query\x00";

// Challenge round-trips allowed before the real reply.
const MAX_EXCHANGES: usize = 3;

#[derive(Debug)]
pub enum ProbeError {
    Io(std::io::Error),
    Timeout,
    Malformed(&'static str),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "query io error: {}", e),
            Self::Timeout => write!(f, "query timed out"),
            Self::Malformed(what) => write!(f, "malformed query response: {}", what),
        }
    }
}

#[derive(Debug)]
struct InfoReply {
    players: i64,
    max_players: i64,
    version: String,
    ping_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerEntry {
    pub name: String,
    pub score: i32,
    pub duration: f32,
}

/// Query one endpoint. Never fails: any error becomes a Down status.
pub async fn probe(endpoint: &ServerEndpoint, timeout: Duration) -> ServerStatus {
    match query_info(&endpoint.address(), timeout).await {
        Ok(info) => ServerStatus {
            name: endpoint.name.clone(),
            status: ServerState::Ok,
            ping: round2(info.ping_ms),
            ip: endpoint.address(),
            players: info.players,
            max_players: info.max_players,
            version: info.version,
        },
        Err(e) => {
            debug!(
                "probe failed for {} ({}): {}",
                endpoint.name,
                endpoint.address(),
                e
            );
            ServerStatus::down(endpoint)
        }
    }
}

/// Probe every endpoint concurrently, one task each, and return exactly one
/// status per endpoint in catalog order.
pub async fn probe_all(endpoints: &[ServerEndpoint], timeout: Duration) -> Vec<ServerStatus> {
    let handles: Vec<_> = endpoints
        .iter()
        .cloned()
        .map(|endpoint| tokio::spawn(async move { probe(&endpoint, timeout).await }))
        .collect();

    let mut statuses = Vec::with_capacity(endpoints.len());
    for (handle, endpoint) in handles.into_iter().zip(endpoints) {
        match handle.await {
            Ok(status) => statuses.push(status),
            Err(_) => statuses.push(ServerStatus::down(endpoint)),
        }
    }
    statuses
}

async fn query_info(addr: &str, timeout: Duration) -> Result<InfoReply, ProbeError> {
    let socket = connect(addr).await?;
    let mut request = info_request(None);

    for _ in 0..MAX_EXCHANGES {
        let (packet, ping_ms) = exchange(&socket, &request, timeout).await?;
        let (kind, body) = split_packet(&packet)?;
        match kind {
            A2S_INFO_REPLY => return parse_info(body, ping_ms),
            A2S_CHALLENGE_REPLY => {
                request = info_request(Some(read_challenge(body)?));
            }
            _ => return Err(ProbeError::Malformed("unexpected reply type")),
        }
    }
    Err(ProbeError::Malformed("challenge loop"))
}

/// A2S_PLAYER query for the on-demand player listing. Failures surface to the
/// caller here; only live-status probing degrades silently.
pub async fn query_players(addr: &str, timeout: Duration) -> Result<Vec<PlayerEntry>, ProbeError> {
    let socket = connect(addr).await?;
    let mut request = player_request([0xFF, 0xFF, 0xFF, 0xFF]);

    for _ in 0..MAX_EXCHANGES {
        let (packet, _) = exchange(&socket, &request, timeout).await?;
        let (kind, body) = split_packet(&packet)?;
        match kind {
            A2S_PLAYER_REPLY => return parse_players(body),
            A2S_CHALLENGE_REPLY => {
                request = player_request(read_challenge(body)?);
            }
            _ => return Err(ProbeError::Malformed("unexpected reply type")),
        }
    }
    Err(ProbeError::Malformed("challenge loop"))
}

async fn connect(addr: &str) -> Result<UdpSocket, ProbeError> {
    let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(ProbeError::Io)?;
    socket.connect(addr).await.map_err(ProbeError::Io)?;
    Ok(socket)
}

async fn exchange(
    socket: &UdpSocket,
    request: &[u8],
    timeout: Duration,
) -> Result<(Vec<u8>, f64), ProbeError> {
    socket.send(request).await.map_err(ProbeError::Io)?;
    let sent_at = Instant::now();

    let mut buffer = [0u8; 1400];
    let len = match tokio::time::timeout(timeout, socket.recv(&mut buffer)).await {
        Ok(Ok(len)) => len,
        Ok(Err(e)) => return Err(ProbeError::Io(e)),
        Err(_) => return Err(ProbeError::Timeout),
    };

    let ping_ms = sent_at.elapsed().as_secs_f64() * 1000.0;
    Ok((buffer[..len].to_vec(), ping_ms))
}

fn info_request(challenge: Option<[u8; 4]>) -> Vec<u8> {
    let mut request = PACKET_HEADER.to_vec();
    request.push(A2S_INFO);
    request.extend_from_slice(INFO_PAYLOAD);
    if let Some(challenge) = challenge {
        request.extend_from_slice(&challenge);
    }
    request
}

fn player_request(challenge: [u8; 4]) -> Vec<u8> {
    let mut request = PACKET_HEADER.to_vec();
    request.push(A2S_PLAYER);
    request.extend_from_slice(&challenge);
    request
}

fn split_packet(packet: &[u8]) -> Result<(u8, &[u8]), ProbeError> {
    if packet.len() < 5 || packet[..4] != PACKET_HEADER {
        return Err(ProbeError::Malformed("bad packet header"));
    }
    Ok((packet[4], &packet[5..]))
}

fn read_challenge(body: &[u8]) -> Result<[u8; 4], ProbeError> {
    body.get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or(ProbeError::Malformed("short challenge"))
}

fn parse_info(body: &[u8], ping_ms: f64) -> Result<InfoReply, ProbeError> {
    let mut cursor = Cursor::new(body);

    // protocol, then name/map/folder/game strings
    cursor
        .read_u8()
        .map_err(|_| ProbeError::Malformed("truncated info"))?;
    for _ in 0..4 {
        read_cstring(&mut cursor)?;
    }
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| ProbeError::Malformed("truncated info"))?;

    let players = cursor
        .read_u8()
        .map_err(|_| ProbeError::Malformed("truncated info"))? as i64;
    let max_players = cursor
        .read_u8()
        .map_err(|_| ProbeError::Malformed("truncated info"))? as i64;

    // bots, server type, environment, visibility, vac
    for _ in 0..5 {
        cursor
            .read_u8()
            .map_err(|_| ProbeError::Malformed("truncated info"))?;
    }

    let version = read_cstring(&mut cursor)?;

    Ok(InfoReply {
        players,
        max_players,
        version,
        ping_ms,
    })
}

fn parse_players(body: &[u8]) -> Result<Vec<PlayerEntry>, ProbeError> {
    let mut cursor = Cursor::new(body);
    let count = cursor
        .read_u8()
        .map_err(|_| ProbeError::Malformed("truncated player list"))?;

    let mut players = Vec::with_capacity(count as usize);
    for _ in 0..count {
        cursor
            .read_u8()
            .map_err(|_| ProbeError::Malformed("truncated player entry"))?;
        let name = read_cstring(&mut cursor)?;
        let score = cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| ProbeError::Malformed("truncated player entry"))?;
        let duration = cursor
            .read_f32::<LittleEndian>()
            .map_err(|_| ProbeError::Malformed("truncated player entry"))?;
        players.push(PlayerEntry {
            name,
            score,
            duration,
        });
    }
    Ok(players)
}

fn read_cstring(cursor: &mut Cursor<&[u8]>) -> Result<String, ProbeError> {
    let mut bytes = Vec::new();
    loop {
        let byte = cursor
            .read_u8()
            .map_err(|_| ProbeError::Malformed("unterminated string"))?;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn endpoint(name: &str, addr: SocketAddr) -> ServerEndpoint {
        ServerEndpoint {
            name: name.to_string(),
            ip: addr.ip().to_string(),
            port: addr.port(),
        }
    }

    fn info_reply(players: u8, max_players: u8, version: &str) -> Vec<u8> {
        let mut packet = PACKET_HEADER.to_vec();
        packet.push(A2S_INFO_REPLY);
        packet.push(17); // protocol
        for s in ["koth east", "omega", "sj", "Sector Jump"] {
            packet.extend_from_slice(s.as_bytes());
            packet.push(0);
        }
        packet.extend_from_slice(&1234u16.to_le_bytes());
        packet.push(players);
        packet.push(max_players);
        packet.push(0); // bots
        packet.extend_from_slice(&[b'd', b'l', 0, 1]); // type, env, visibility, vac
        packet.extend_from_slice(version.as_bytes());
        packet.push(0);
        packet
    }

    /// One-shot fake game server; optionally demands a challenge first.
    async fn fake_server(reply: Vec<u8>, with_challenge: bool) -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let challenge = [0x0A, 0x0B, 0x0C, 0x0D];
            let mut buf = [0u8; 1400];
            if with_challenge {
                let (_, peer) = socket.recv_from(&mut buf).await.unwrap();
                let mut packet = PACKET_HEADER.to_vec();
                packet.push(A2S_CHALLENGE_REPLY);
                packet.extend_from_slice(&challenge);
                socket.send_to(&packet, peer).await.unwrap();
            }
            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            if with_challenge {
                assert_eq!(&buf[len - 4..len], &challenge[..]);
            }
            socket.send_to(&reply, peer).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn probe_reports_live_server() {
        let addr = fake_server(info_reply(3, 20, "1.198.072"), false).await;
        let status = probe(&endpoint("east", addr), Duration::from_secs(1)).await;

        assert_eq!(status.status, ServerState::Ok);
        assert_eq!(status.players, 3);
        assert_eq!(status.max_players, 20);
        assert_eq!(status.version, "1.198.072");
        assert_eq!(status.ip, addr.to_string());
        assert!(status.ping >= 0.0);
    }

    #[tokio::test]
    async fn probe_follows_challenge_handshake() {
        let addr = fake_server(info_reply(7, 32, "2.0"), true).await;
        let status = probe(&endpoint("east", addr), Duration::from_secs(1)).await;
        assert_eq!(status.status, ServerState::Ok);
        assert_eq!(status.players, 7);
    }

    #[tokio::test]
    async fn probe_degrades_to_down_on_timeout() {
        // Nothing listens on port 1; a short timeout keeps the test fast.
        let endpoint = ServerEndpoint {
            name: "ghost".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 1,
        };
        let status = probe(&endpoint, Duration::from_millis(200)).await;

        assert_eq!(status.status, ServerState::Down);
        assert_eq!(status.ping, 0.0);
        assert_eq!(status.players, 0);
        assert_eq!(status.max_players, 0);
        assert_eq!(status.version, "0");
    }

    #[tokio::test]
    async fn probe_degrades_to_down_on_malformed_reply() {
        let addr = fake_server(vec![0x01, 0x02, 0x03], false).await;
        let status = probe(&endpoint("garbled", addr), Duration::from_secs(1)).await;
        assert_eq!(status.status, ServerState::Down);
    }

    #[tokio::test]
    async fn probe_all_keeps_catalog_order_and_isolates_failures() {
        let live = fake_server(info_reply(5, 20, "1.0"), false).await;
        let endpoints = vec![
            ServerEndpoint {
                name: "dead".to_string(),
                ip: "127.0.0.1".to_string(),
                port: 1,
            },
            endpoint("live", live),
        ];

        let statuses = probe_all(&endpoints, Duration::from_millis(300)).await;

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].name, "dead");
        assert_eq!(statuses[0].status, ServerState::Down);
        assert_eq!(statuses[1].name, "live");
        assert_eq!(statuses[1].status, ServerState::Ok);
        assert_eq!(statuses[1].players, 5);
    }

    #[tokio::test]
    async fn player_query_parses_entries() {
        let mut reply = PACKET_HEADER.to_vec();
        reply.push(A2S_PLAYER_REPLY);
        reply.push(2);
        for (i, (name, score, duration)) in
            [("alice", 12i32, 30.5f32), ("bob", 4, 8.25)]
                .into_iter()
                .enumerate()
        {
            reply.push(i as u8);
            reply.extend_from_slice(name.as_bytes());
            reply.push(0);
            reply.extend_from_slice(&score.to_le_bytes());
            reply.extend_from_slice(&duration.to_le_bytes());
        }

        let addr = fake_server(reply, true).await;
        let players = query_players(&addr.to_string(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "alice");
        assert_eq!(players[0].score, 12);
        assert_eq!(players[1].name, "bob");
        assert_eq!(players[1].duration, 8.25);
    }

    #[test]
    fn ping_rounds_to_two_decimals() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(0.005), 0.01);
    }
}
