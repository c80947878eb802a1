use pnet::packet::ipv4::{Ipv4Flags, MutableIpv4Packet};
use rand::Rng;
use tracing::trace;

use crate::tcp::{Quirk, Signature};

/// ECN codepoint bits of the type-of-service byte
const IP_TOS_ECN: u8 = 0b11;
/// Must be zero ("evil bit")
pub const IP4_MBZ: u8 = 0b0100;

/// Mutable access to the IPv4 header fields a signature controls.
///
/// `fragment_flags` is the 3-bit flags field: reserved, DF, MF.
pub trait Ipv4HeaderView {
    fn type_of_service(&self) -> u8;
    fn set_type_of_service(&mut self, tos: u8);
    fn fragment_flags(&self) -> u8;
    fn set_fragment_flags(&mut self, flags: u8);
    fn ip_id(&self) -> u16;
    fn set_ip_id(&mut self, id: u16);
}

impl Ipv4HeaderView for MutableIpv4Packet<'_> {
    fn type_of_service(&self) -> u8 {
        (self.get_dscp() << 2) | self.get_ecn()
    }

    fn set_type_of_service(&mut self, tos: u8) {
        self.set_dscp(tos >> 2);
        self.set_ecn(tos & IP_TOS_ECN);
    }

    fn fragment_flags(&self) -> u8 {
        self.get_flags()
    }

    fn set_fragment_flags(&mut self, flags: u8) {
        self.set_flags(flags);
    }

    fn ip_id(&self) -> u16 {
        self.get_identification()
    }

    fn set_ip_id(&mut self, id: u16) {
        self.set_identification(id);
    }
}

/// Rewrites type-of-service, flags and identification so the header shows the
/// IP-level quirks of `signature`.
pub fn spoof_ip_layer<H, R>(header: &mut H, signature: &Signature, rng: &mut R)
where
    H: Ipv4HeaderView + ?Sized,
    R: Rng + ?Sized,
{
    let mut tos = header.type_of_service() & !IP_TOS_ECN;
    let mut flags = header.fragment_flags();
    let mut id = header.ip_id();

    if signature.has_quirk(Quirk::Df) {
        flags |= Ipv4Flags::DontFragment;

        // id+: DF set and identification non-zero
        if signature.has_quirk(Quirk::NonZeroID) {
            if id == 0 {
                id = rng.gen_range(1..=u16::MAX);
            }
        } else {
            id = 0;
        }
    } else {
        flags &= !Ipv4Flags::DontFragment;

        // id-: DF not set and identification zero
        if signature.has_quirk(Quirk::ZeroID) {
            id = 0;
        } else if id == 0 {
            id = rng.gen_range(1..=u16::MAX);
        }
    }

    if signature.has_quirk(Quirk::MustBeZero) {
        flags |= IP4_MBZ;
    } else {
        flags &= !IP4_MBZ;
    }

    // Masks rather than sets the codepoint. Kept as-is until the intended ECN
    // semantics are settled.
    if signature.has_quirk(Quirk::Ecn) {
        tos &= rng.gen_range(1..=2u8);
    }

    trace!("ip layer: tos={:#04x} flags={:#05b} id={}", tos, flags, id);

    header.set_type_of_service(tos);
    header.set_fragment_flags(flags);
    header.set_ip_id(id);
}
