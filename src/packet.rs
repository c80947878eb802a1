use std::net::Ipv4Addr;

use pnet::packet::{
    ip::IpNextHeaderProtocols,
    ipv4::{self, Ipv4Flags, Ipv4Packet, MutableIpv4Packet},
    tcp::{ipv4_checksum, MutableTcpPacket, TcpOptionNumber, TcpOptionNumbers::*, TcpPacket},
    Packet,
};
use rand::Rng;
use tracing::debug;

use crate::error::SpoofError;
use crate::ip_layer::spoof_ip_layer;
use crate::tcp::{IpVersion, Signature};
use crate::tcp_layer::spoof_tcp_layer;

const IPV4_HEADER_LEN: usize = 20;
const TCP_HEADER_LEN: usize = 20;
/// 15 words of data offset minus the fixed header
const MAX_TCP_OPTIONS_LEN: usize = 40;

/// A TCP option as it sits on the wire: kind plus raw payload (without kind
/// and length bytes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTcpOption {
    pub kind: TcpOptionNumber,
    pub data: Vec<u8>,
}

impl RawTcpOption {
    pub fn new(kind: TcpOptionNumber, data: Vec<u8>) -> Self {
        Self { kind, data }
    }
}

/// Owned, mutable view of a TCP segment.
///
/// Rewriting options changes the header length, so the segment is decoded
/// into this form, rewritten, and serialized again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TcpSegment {
    pub source: u16,
    pub destination: u16,
    pub sequence: u32,
    pub acknowledgement: u32,
    pub flags: u8,
    pub window: u16,
    pub urgent_ptr: u16,
    pub options: Vec<RawTcpOption>,
    pub payload: Vec<u8>,
}

impl TcpSegment {
    pub fn from_packet(packet: &TcpPacket) -> Result<Self, SpoofError> {
        let bytes = packet.packet();
        let header_len = usize::from(packet.get_data_offset()) * 4;
        if header_len < TCP_HEADER_LEN || header_len > bytes.len() {
            return Err(SpoofError::Packet(format!(
                "TCP data offset {} does not fit segment of {} bytes",
                packet.get_data_offset(),
                bytes.len()
            )));
        }

        Ok(TcpSegment {
            source: packet.get_source(),
            destination: packet.get_destination(),
            sequence: packet.get_sequence(),
            acknowledgement: packet.get_acknowledgement(),
            flags: packet.get_flags(),
            window: packet.get_window(),
            urgent_ptr: packet.get_urgent_ptr(),
            options: decode_options(&bytes[TCP_HEADER_LEN..header_len])?,
            payload: bytes[header_len..].to_vec(),
        })
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag == flag
    }

    pub fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Serializes the segment. Options are zero-padded to a 4-byte boundary;
    /// the checksum is left zero.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SpoofError> {
        let options = encode_options(&self.options)?;
        let header_len = TCP_HEADER_LEN + options.len();
        let mut buf = vec![0u8; header_len + self.payload.len()];

        {
            let mut tcp = MutableTcpPacket::new(&mut buf)
                .ok_or_else(|| SpoofError::Packet("TCP buffer too short".to_string()))?;
            tcp.set_source(self.source);
            tcp.set_destination(self.destination);
            tcp.set_sequence(self.sequence);
            tcp.set_acknowledgement(self.acknowledgement);
            tcp.set_data_offset((header_len / 4) as u8);
            tcp.set_flags(self.flags);
            tcp.set_window(self.window);
            tcp.set_urgent_ptr(self.urgent_ptr);
        }

        buf[TCP_HEADER_LEN..header_len].copy_from_slice(&options);
        buf[header_len..].copy_from_slice(&self.payload);
        Ok(buf)
    }
}

fn decode_options(mut buf: &[u8]) -> Result<Vec<RawTcpOption>, SpoofError> {
    let mut options = vec![];

    while let Some((&number, rest)) = buf.split_first() {
        match TcpOptionNumber(number) {
            EOL => {
                // everything after the end of list is padding
                options.push(RawTcpOption::new(EOL, vec![]));
                break;
            }
            NOP => {
                options.push(RawTcpOption::new(NOP, vec![]));
                buf = rest;
            }
            kind => {
                let len = rest.first().map(|len| usize::from(*len)).unwrap_or(0);
                if len < 2 || len > buf.len() {
                    return Err(SpoofError::Packet(format!(
                        "malformed TCP option {} with length {}",
                        number, len
                    )));
                }
                options.push(RawTcpOption::new(kind, buf[2..len].to_vec()));
                buf = &buf[len..];
            }
        }
    }

    Ok(options)
}

fn encode_options(options: &[RawTcpOption]) -> Result<Vec<u8>, SpoofError> {
    let mut buf = vec![];

    for option in options {
        match option.kind {
            EOL | NOP => buf.push(option.kind.0),
            kind => {
                let len = u8::try_from(option.data.len() + 2).map_err(|_| {
                    SpoofError::Packet(format!("TCP option {} payload too long", kind.0))
                })?;
                buf.push(kind.0);
                buf.push(len);
                buf.extend_from_slice(&option.data);
            }
        }
    }

    while buf.len() % 4 != 0 {
        buf.push(EOL.0);
    }

    if buf.len() > MAX_TCP_OPTIONS_LEN {
        return Err(SpoofError::Packet(format!(
            "TCP options take {} bytes, at most {} fit",
            buf.len(),
            MAX_TCP_OPTIONS_LEN
        )));
    }

    Ok(buf)
}

/// Rewrites a raw IPv4/TCP packet under `signature`.
///
/// IP fields are rewritten first, then the TCP segment. The packet is
/// re-assembled with its new total length and both checksums recomputed.
pub fn rewrite_ipv4_packet<R>(
    packet: &[u8],
    signature: &Signature,
    rng: &mut R,
) -> Result<Vec<u8>, SpoofError>
where
    R: Rng + ?Sized,
{
    if signature.version == IpVersion::V6 {
        return Err(SpoofError::Packet(
            "signature is IPv6-only, packet is IPv4".to_string(),
        ));
    }

    let ip = Ipv4Packet::new(packet)
        .ok_or_else(|| SpoofError::Packet("IPv4 packet too short".to_string()))?;

    if ip.get_version() != 4 {
        return Err(SpoofError::Packet(format!(
            "IP version {} is not IPv4",
            ip.get_version()
        )));
    }

    if ip.get_next_level_protocol() != IpNextHeaderProtocols::Tcp {
        return Err(SpoofError::Packet(format!(
            "IPv4 packet with non-TCP payload: {}",
            ip.get_next_level_protocol()
        )));
    }

    if ip.get_fragment_offset() > 0
        || (ip.get_flags() & Ipv4Flags::MoreFragments) == Ipv4Flags::MoreFragments
    {
        return Err(SpoofError::Packet("IPv4 fragment".to_string()));
    }

    let header_len = usize::from(ip.get_header_length()) * 4;
    let total_len = usize::from(ip.get_total_length());
    if header_len < IPV4_HEADER_LEN || total_len < header_len || total_len > packet.len() {
        return Err(SpoofError::Packet(format!(
            "IPv4 header length {} / total length {} do not fit {} bytes",
            header_len,
            total_len,
            packet.len()
        )));
    }

    let mut header = packet[..header_len].to_vec();
    {
        let mut ip = MutableIpv4Packet::new(&mut header)
            .ok_or_else(|| SpoofError::Packet("IPv4 header too short".to_string()))?;
        spoof_ip_layer(&mut ip, signature, rng);
    }

    let tcp = TcpPacket::new(&packet[header_len..total_len])
        .ok_or_else(|| SpoofError::Packet("TCP packet too short".to_string()))?;
    let mut segment = TcpSegment::from_packet(&tcp)?;
    spoof_tcp_layer(&mut segment, signature, rng)?;

    let mut out = header;
    out.extend_from_slice(&segment.to_bytes()?);
    let total_len = u16::try_from(out.len())
        .map_err(|_| SpoofError::Packet(format!("rewritten packet is {} bytes", out.len())))?;

    let (source, destination) = finish_ipv4_header(&mut out, total_len)?;
    finish_tcp_checksum(&mut out[header_len..], &source, &destination)?;

    debug!(
        "rewrote {} -> {} ({} -> {} bytes)",
        source,
        destination,
        packet.len(),
        out.len()
    );

    Ok(out)
}

fn finish_ipv4_header(buf: &mut [u8], total_len: u16) -> Result<(Ipv4Addr, Ipv4Addr), SpoofError> {
    let mut ip = MutableIpv4Packet::new(buf)
        .ok_or_else(|| SpoofError::Packet("IPv4 header too short".to_string()))?;
    ip.set_total_length(total_len);
    ip.set_checksum(0);
    let checksum = ipv4::checksum(&ip.to_immutable());
    ip.set_checksum(checksum);
    Ok((ip.get_source(), ip.get_destination()))
}

fn finish_tcp_checksum(
    buf: &mut [u8],
    source: &Ipv4Addr,
    destination: &Ipv4Addr,
) -> Result<(), SpoofError> {
    let mut tcp = MutableTcpPacket::new(buf)
        .ok_or_else(|| SpoofError::Packet("TCP packet too short".to_string()))?;
    tcp.set_checksum(0);
    let checksum = ipv4_checksum(&tcp.to_immutable(), source, destination);
    tcp.set_checksum(checksum);
    Ok(())
}
