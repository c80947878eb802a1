use pnet::packet::tcp::TcpFlags;
use rand::Rng;
use tracing::debug;

use crate::error::SpoofError;
use crate::packet::TcpSegment;
use crate::tcp::{Quirk, Signature};
use crate::tcp_options::spoof_tcp_options;
use crate::window_size::spoof_tcp_window;

/// Rewrites sequence, acknowledgment, urgent pointer and the ACK/URG/PSH flags,
/// then rebuilds the options and the window, in that order.
///
/// On error the segment may already be partially rewritten and should be
/// discarded.
pub fn spoof_tcp_layer<R>(
    segment: &mut TcpSegment,
    signature: &Signature,
    rng: &mut R,
) -> Result<(), SpoofError>
where
    R: Rng + ?Sized,
{
    // seq-: sequence number is zero
    if signature.has_quirk(Quirk::SeqNumZero) {
        segment.sequence = 0;
    } else if segment.sequence == 0 {
        segment.sequence = rng.gen_range(1..=u32::MAX);
    }

    if signature.has_quirk(Quirk::AckNumNonZero) {
        // ack+: ACK number is non-zero, but ACK flag not set
        segment.set_flag(TcpFlags::ACK, false);
        if segment.acknowledgement == 0 {
            segment.acknowledgement = rng.gen_range(1..=u32::MAX);
        }
    } else if signature.has_quirk(Quirk::AckNumZero) {
        // ack-: ACK number is zero, but ACK flag set
        segment.set_flag(TcpFlags::ACK, true);
        segment.acknowledgement = 0;
    }

    if signature.has_quirk(Quirk::NonZeroURG) {
        // uptr+: URG pointer is non-zero, but URG flag not set
        segment.set_flag(TcpFlags::URG, false);
        if segment.urgent_ptr == 0 {
            segment.urgent_ptr = rng.gen_range(1..=u16::MAX);
        }
    } else if signature.has_quirk(Quirk::Urg) {
        segment.set_flag(TcpFlags::URG, true);
    }

    segment.set_flag(TcpFlags::PSH, signature.has_quirk(Quirk::Push));

    spoof_tcp_options(segment, signature, rng)?;
    spoof_tcp_window(segment, signature, rng)?;

    debug!(
        "tcp layer: seq={} ack={} flags={:#010b} win={} urg={} options={}",
        segment.sequence,
        segment.acknowledgement,
        segment.flags,
        segment.window,
        segment.urgent_ptr,
        segment.options.len()
    );

    Ok(())
}
