//! Minimal SOCKS4a / SOCKS5 CONNECT handshakes
//!
//! Only the no-authentication flows are spoken. Both handshakes leave the
//! stream relaying to the requested target on success.

use crate::error::ProbeError;
use std::net::Ipv4Addr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const SOCKS4_VERSION: u8 = 0x04;
const SOCKS5_VERSION: u8 = 0x05;
const CMD_CONNECT: u8 = 0x01;
const SOCKS4_GRANTED: u8 = 0x5a;
const SOCKS5_NO_AUTH: u8 = 0x00;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Ask a SOCKS4 proxy to connect to `host:port`
///
/// Hostnames are sent with the 4a extension so the proxy resolves them.
pub async fn socks4_connect<S>(stream: &mut S, host: &str, port: u16) -> Result<(), ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request = vec![SOCKS4_VERSION, CMD_CONNECT];
    request.extend_from_slice(&port.to_be_bytes());
    match host.parse::<Ipv4Addr>() {
        Ok(ip) => {
            request.extend_from_slice(&ip.octets());
            request.push(0x00);
        }
        Err(_) => {
            // 0.0.0.x with x != 0 marks a 4a request
            request.extend_from_slice(&[0, 0, 0, 1]);
            request.push(0x00);
            request.extend_from_slice(host.as_bytes());
            request.push(0x00);
        }
    }
    stream.write_all(&request).await?;

    let mut reply = [0u8; 8];
    stream.read_exact(&mut reply).await?;
    if reply[0] != 0x00 {
        return Err(ProbeError::Negotiation("invalid SOCKS4 reply version"));
    }
    if reply[1] != SOCKS4_GRANTED {
        return Err(ProbeError::Socks4Reply(reply[1]));
    }

    Ok(())
}

/// Ask a SOCKS5 proxy to connect to `host:port` without authentication
pub async fn socks5_connect<S>(stream: &mut S, host: &str, port: u16) -> Result<(), ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(&[SOCKS5_VERSION, 0x01, SOCKS5_NO_AUTH])
        .await?;

    let mut greeting = [0u8; 2];
    stream.read_exact(&mut greeting).await?;
    if greeting[0] != SOCKS5_VERSION {
        return Err(ProbeError::Negotiation("invalid SOCKS5 greeting version"));
    }
    if greeting[1] != SOCKS5_NO_AUTH {
        return Err(ProbeError::Negotiation("no acceptable SOCKS5 auth method"));
    }

    let mut request = vec![SOCKS5_VERSION, CMD_CONNECT, 0x00];
    match host.parse::<Ipv4Addr>() {
        Ok(ip) => {
            request.push(ATYP_IPV4);
            request.extend_from_slice(&ip.octets());
        }
        Err(_) => {
            let len = u8::try_from(host.len())
                .map_err(|_| ProbeError::Negotiation("target hostname too long"))?;
            request.push(ATYP_DOMAIN);
            request.push(len);
            request.extend_from_slice(host.as_bytes());
        }
    }
    request.extend_from_slice(&port.to_be_bytes());
    stream.write_all(&request).await?;

    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    if header[0] != SOCKS5_VERSION {
        return Err(ProbeError::Negotiation("invalid SOCKS5 reply version"));
    }
    if header[1] != 0x00 {
        return Err(ProbeError::Socks5Reply(header[1]));
    }

    // Drain the bound address so the stream is positioned at relayed data
    let addr_len = match header[3] {
        ATYP_IPV4 => 4,
        ATYP_IPV6 => 16,
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;
            len[0] as usize
        }
        _ => return Err(ProbeError::Negotiation("unknown SOCKS5 address type")),
    };
    let mut bound = vec![0u8; addr_len + 2];
    stream.read_exact(&mut bound).await?;

    Ok(())
}

/// Send a minimal HTTP request over an established relay and require a reply
pub async fn http_roundtrip<S>(stream: &mut S, host: &str) -> Result<usize, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = format!(
        "GET / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        host
    );
    stream.write_all(request.as_bytes()).await?;

    let mut buf = [0u8; 1024];
    let read = stream.read(&mut buf).await?;
    if read == 0 {
        return Err(ProbeError::EmptyResponse);
    }

    Ok(read)
}
