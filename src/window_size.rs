use pnet::packet::tcp::TcpOptionNumbers::MSS;
use rand::Rng;
use tracing::trace;

use crate::error::SpoofError;
use crate::packet::TcpSegment;
use crate::tcp::{Signature, WindowSize};

/// 20 IP + 20 TCP
pub(crate) const MIN_TCP4: u16 = 40;

/// Sets the TCP window from the signature window size.
///
/// Must run after the options were rebuilt: MSS- and MTU-relative windows
/// are derived from the MSS option already on the segment.
pub fn spoof_tcp_window<R>(
    segment: &mut TcpSegment,
    signature: &Signature,
    rng: &mut R,
) -> Result<(), SpoofError>
where
    R: Rng + ?Sized,
{
    let wsize = signature.wsize;

    match wsize {
        WindowSize::Value(window) => segment.window = window,
        WindowSize::Mss(multiplier) => {
            let mss = option_mss(segment).ok_or(SpoofError::MissingMss)?;
            segment.window = mss
                .checked_mul(multiplier)
                .ok_or(SpoofError::WindowOverflow { wsize, mss })?;
        }
        WindowSize::Mtu(multiplier) => {
            let mss = option_mss(segment).ok_or(SpoofError::MissingMss)?;
            segment.window = mss
                .checked_add(MIN_TCP4)
                .and_then(|mtu| mtu.checked_mul(multiplier))
                .ok_or(SpoofError::WindowOverflow { wsize, mss })?;
        }
        WindowSize::Mod(divisor) => {
            if let Some(max_factor) = u16::MAX.checked_div(divisor) {
                if segment.window == 0 || segment.window % divisor != 0 {
                    segment.window = rng.gen_range(1..=max_factor) * divisor;
                }
            }
        }
        WindowSize::Any => {}
    }

    trace!("window {} from {}", segment.window, wsize);
    Ok(())
}

fn option_mss(segment: &TcpSegment) -> Option<u16> {
    segment
        .options
        .iter()
        .filter(|option| option.kind == MSS)
        .find_map(|option| match option.data.as_slice() {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        })
}
