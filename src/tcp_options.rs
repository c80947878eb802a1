use pnet::packet::tcp::{TcpFlags, TcpOptionNumbers::*};
use rand::Rng;
use tracing::trace;

use crate::error::SpoofError;
use crate::packet::{RawTcpOption, TcpSegment};
use crate::tcp::{Quirk, Signature, TcpOption, WindowSize};
use crate::window_size::MIN_TCP4;

/// Largest window scale shift RFC 7323 allows
const MAX_WINDOW_SCALE: u8 = 14;
/// 576-byte minimum datagram minus 40 bytes of IPv4 and TCP headers (RFC 791)
const MIN_MSS: u16 = 536;

/// Values found in the incoming options, reused when the signature allows it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct OptionHints {
    mss: Option<u16>,
    timestamps: Option<(u32, u32)>,
    wscale: Option<u8>,
}

impl OptionHints {
    fn collect(options: &[RawTcpOption]) -> Self {
        let mut hints = OptionHints::default();

        for option in options {
            let data = &option.data;
            match option.kind {
                MSS if data.len() >= 2 => {
                    hints.mss = Some(u16::from_be_bytes([data[0], data[1]]));
                }
                TIMESTAMPS if data.len() >= 8 => {
                    hints.timestamps = Some((
                        u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
                        u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
                    ));
                }
                WSCALE if !data.is_empty() => {
                    hints.wscale = Some(data[0]);
                }
                _ => {}
            }
        }

        hints
    }
}

/// Replaces the segment options with the signature layout, in layout order.
///
/// Options missing from the layout are dropped. A layout entry without a
/// synthesis rule (`sack`) fails with [`SpoofError::UnsupportedOption`].
pub fn spoof_tcp_options<R>(
    segment: &mut TcpSegment,
    signature: &Signature,
    rng: &mut R,
) -> Result<(), SpoofError>
where
    R: Rng + ?Sized,
{
    let hints = OptionHints::collect(&segment.options);
    let syn = segment.has_flag(TcpFlags::SYN);
    trace!("option hints: {:?}", hints);

    let mut options = Vec::with_capacity(signature.olayout.len());

    for option in &signature.olayout {
        let rebuilt = match option {
            TcpOption::Ws => {
                RawTcpOption::new(WSCALE, vec![window_scale(signature, hints.wscale, rng)?])
            }
            TcpOption::Mss => {
                let mss = maximum_segment_size(signature, hints.mss, rng)?;
                RawTcpOption::new(MSS, mss.to_be_bytes().to_vec())
            }
            TcpOption::TS => {
                let (own, peer) = timestamps(signature, hints.timestamps, syn, rng);
                let mut data = own.to_be_bytes().to_vec();
                data.extend_from_slice(&peer.to_be_bytes());
                RawTcpOption::new(TIMESTAMPS, data)
            }
            TcpOption::Sok => RawTcpOption::new(SACK_PERMITTED, vec![]),
            TcpOption::Nop => RawTcpOption::new(NOP, vec![]),
            TcpOption::Eol => RawTcpOption::new(EOL, vec![]),
            TcpOption::Sack => return Err(SpoofError::UnsupportedOption(*option)),
        };

        options.push(rebuilt);
    }

    segment.options = options;
    Ok(())
}

fn window_scale<R>(signature: &Signature, hint: Option<u8>, rng: &mut R) -> Result<u8, SpoofError>
where
    R: Rng + ?Sized,
{
    if let Some(scale) = signature.wscale {
        return u8::try_from(scale).map_err(|_| SpoofError::WindowScaleOutOfRange(scale));
    }

    // exws: excessive window scaling factor (> 14)
    Ok(if signature.has_quirk(Quirk::ExcessiveWindowScaling) {
        match hint {
            Some(scale) if scale > MAX_WINDOW_SCALE && scale < u8::MAX => scale,
            _ => rng.gen_range(MAX_WINDOW_SCALE + 1..u8::MAX),
        }
    } else {
        hint.unwrap_or_else(|| rng.gen_range(1..=MAX_WINDOW_SCALE))
    })
}

fn maximum_segment_size<R>(
    signature: &Signature,
    hint: Option<u16>,
    rng: &mut R,
) -> Result<u16, SpoofError>
where
    R: Rng + ?Sized,
{
    if let Some(mss) = signature.mss {
        return u16::try_from(mss).map_err(|_| SpoofError::MssOutOfRange(mss));
    }

    // keep the derived window inside 16 bits
    let max = match signature.wsize {
        WindowSize::Mss(multiplier) => u16::MAX.checked_div(multiplier).unwrap_or(u16::MAX),
        WindowSize::Mtu(multiplier) => u16::MAX
            .checked_div(multiplier)
            .unwrap_or(u16::MAX)
            .saturating_sub(MIN_TCP4),
        _ => u16::MAX,
    };
    // no MSS keeps an MTU multiple this large inside 16 bits
    if max == 0 {
        return Err(SpoofError::WindowOverflow {
            wsize: signature.wsize,
            mss: 0,
        });
    }
    let min = MIN_MSS.min(max);

    Ok(match hint {
        Some(mss) if (min..=max).contains(&mss) => mss,
        _ => rng.gen_range(min..=max),
    })
}

fn timestamps<R>(
    signature: &Signature,
    hint: Option<(u32, u32)>,
    syn: bool,
    rng: &mut R,
) -> (u32, u32)
where
    R: Rng + ?Sized,
{
    // ts1-: own timestamp specified as zero
    let own = if signature.has_quirk(Quirk::OwnTimestampZero) {
        0
    } else {
        match hint {
            Some((own, _)) if own != 0 => own,
            _ => rng.gen_range(1..=u32::MAX),
        }
    };

    // ts2+: non-zero peer timestamp on initial SYN
    let peer = if signature.has_quirk(Quirk::PeerTimestampNonZero) && syn {
        match hint {
            Some((_, peer)) if peer != 0 => peer,
            _ => rng.gen_range(1..=u32::MAX),
        }
    } else {
        0
    };

    (own, peer)
}
