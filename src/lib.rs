#![forbid(unsafe_code)]

//! # huginn-net-mimic
//!
//! Rewrites outgoing IPv4/TCP packets so their observable stack behavior
//! matches a p0f TCP signature.
//!
//! A signature such as `4:64:0:*:mss*10,6:mss,sok,ts,nop,ws:df,id+:0` is
//! parsed once into a [`Signature`]; every packet is then rewritten against
//! it. Field values the signature leaves open are taken from the packet
//! itself when they fit, and drawn from the caller's random source otherwise.

pub mod error;
pub mod ip_layer;
pub mod packet;
pub mod tcp;
pub mod tcp_layer;
pub mod tcp_options;
pub mod window_size;

mod display;
mod parse;

pub use error::{SignatureField, SpoofError};
pub use ip_layer::{spoof_ip_layer, Ipv4HeaderView};
pub use packet::{rewrite_ipv4_packet, RawTcpOption, TcpSegment};
pub use tcp::{IpVersion, PayloadSize, Quirk, Quirks, Signature, TcpOption, WindowSize};
pub use tcp_layer::spoof_tcp_layer;
pub use tcp_options::spoof_tcp_options;
pub use window_size::spoof_tcp_window;

use rand::Rng;
use std::str::FromStr;

/// Applies one signature to any number of packets.
///
/// The signature is immutable, so a `Disguise` can be shared across threads;
/// each caller brings its own random source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disguise {
    signature: Signature,
}

impl Disguise {
    pub fn new(signature: Signature) -> Self {
        Self { signature }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Rewrites the IP-level fields of a header in place.
    pub fn spoof_ip<H, R>(&self, header: &mut H, rng: &mut R)
    where
        H: Ipv4HeaderView + ?Sized,
        R: Rng + ?Sized,
    {
        spoof_ip_layer(header, &self.signature, rng)
    }

    /// Rewrites a decoded TCP segment, options and window included.
    pub fn spoof_tcp<R>(&self, segment: &mut TcpSegment, rng: &mut R) -> Result<(), SpoofError>
    where
        R: Rng + ?Sized,
    {
        spoof_tcp_layer(segment, &self.signature, rng)
    }

    /// Rewrites a raw IPv4/TCP packet, returning the re-assembled packet.
    pub fn rewrite_ipv4<R>(&self, packet: &[u8], rng: &mut R) -> Result<Vec<u8>, SpoofError>
    where
        R: Rng + ?Sized,
    {
        rewrite_ipv4_packet(packet, &self.signature, rng)
    }
}

impl From<Signature> for Disguise {
    fn from(signature: Signature) -> Self {
        Self::new(signature)
    }
}

impl FromStr for Disguise {
    type Err = SpoofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self::new)
    }
}
