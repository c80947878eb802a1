use std::str::FromStr;

use crate::error::{SignatureField, SpoofError};
use crate::tcp::{IpVersion, PayloadSize, Quirk, Quirks, Signature, TcpOption, WindowSize};
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::digit1;
use nom::combinator::{all_consuming, map, map_res, value, verify};
use nom::sequence::{preceded, separated_pair};
use nom::{IResult, Parser};
use tracing::trace;

/// Number of colon-delimited fields in a p0f TCP signature.
const SIGNATURE_FIELDS: usize = 8;

/// Largest MSS a signature may carry (20-bit field).
const MAX_SIGNATURE_MSS: u32 = 0xFFFFF;

impl FromStr for Signature {
    type Err = SpoofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let signature = parse_tcp_signature(s)?;
        trace!("parsed signature `{}`: {:?}", s, signature);
        Ok(signature)
    }
}

macro_rules! impl_from_str {
    ($ty:ty, $parse:ident, $field:expr) => {
        impl FromStr for $ty {
            type Err = SpoofError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_field(s, $field, $parse)
            }
        }
    };
}

impl_from_str!(IpVersion, parse_ip_version, SignatureField::IpVersion);
impl_from_str!(WindowSize, parse_window_size, SignatureField::WindowSize);
impl_from_str!(TcpOption, parse_tcp_option, SignatureField::Option);
impl_from_str!(Quirk, parse_quirk, SignatureField::Quirk);
impl_from_str!(PayloadSize, parse_payload_size, SignatureField::PayloadSize);

/// Runs `parser` over the whole of `input`, reporting `field` on failure.
fn parse_field<'a, O, P>(input: &'a str, field: SignatureField, parser: P) -> Result<O, SpoofError>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    all_consuming(parser)
        .parse(input)
        .map(|(_, output)| output)
        .map_err(|_| SpoofError::field(field, input))
}

fn parse_tcp_signature(input: &str) -> Result<Signature, SpoofError> {
    let fields: Vec<&str> = input.split(':').collect();
    if fields.len() != SIGNATURE_FIELDS {
        return Err(SpoofError::InvalidSignature(input.to_string()));
    }

    // fields[2] is the IPv4 options length, which is not modeled
    let version = parse_field(fields[0], SignatureField::IpVersion, parse_ip_version)?;
    let ittl = parse_field(fields[1], SignatureField::InitialTtl, parse_ttl)?;
    let mss = parse_field(fields[3], SignatureField::MaximumSegmentSize, parse_mss)?;
    let (wsize, wscale) = parse_field(fields[4], SignatureField::WindowSize, parse_window)?;
    let olayout = parse_options_layout(fields[5])?;
    let quirks = parse_quirks(fields[6])?;
    let pclass = parse_field(fields[7], SignatureField::PayloadSize, parse_payload_size)?;

    Ok(Signature {
        version,
        ittl,
        mss,
        wsize,
        wscale,
        olayout,
        quirks,
        pclass,
    })
}

fn parse_ip_version(input: &str) -> IResult<&str, IpVersion> {
    alt((
        value(IpVersion::V4, tag("4")),
        value(IpVersion::V6, tag("6")),
        value(IpVersion::Any, tag("*")),
    ))
    .parse(input)
}

fn parse_ttl(input: &str) -> IResult<&str, u32> {
    verify(map_res(digit1, |s: &str| s.parse::<u32>()), |ttl: &u32| {
        *ttl > 0
    })
    .parse(input)
}

fn parse_mss(input: &str) -> IResult<&str, Option<u32>> {
    alt((
        value(None, tag("*")),
        map(
            verify(map_res(digit1, |s: &str| s.parse::<u32>()), |mss: &u32| {
                *mss <= MAX_SIGNATURE_MSS
            }),
            Some,
        ),
    ))
    .parse(input)
}

/// `<size>,<scale>`
fn parse_window(input: &str) -> IResult<&str, (WindowSize, Option<u32>)> {
    separated_pair(parse_window_size, tag(","), parse_window_scale).parse(input)
}

fn parse_window_size(input: &str) -> IResult<&str, WindowSize> {
    alt((
        value(WindowSize::Any, tag("*")),
        map(preceded(tag("mss*"), parse_window_value), WindowSize::Mss),
        map(preceded(tag("mtu*"), parse_window_value), WindowSize::Mtu),
        map(preceded(tag("%"), parse_window_value), WindowSize::Mod),
        map(parse_window_value, WindowSize::Value),
    ))
    .parse(input)
}

/// Literal, divisor or multiplier in (0, 0xFFFF].
fn parse_window_value(input: &str) -> IResult<&str, u16> {
    verify(map_res(digit1, |s: &str| s.parse::<u16>()), |n: &u16| {
        *n > 0
    })
    .parse(input)
}

/// Any non-negative scale; whether it fits the option is checked when synthesizing.
fn parse_window_scale(input: &str) -> IResult<&str, Option<u32>> {
    alt((
        value(None, tag("*")),
        map(map_res(digit1, |s: &str| s.parse::<u32>()), Some),
    ))
    .parse(input)
}

fn parse_options_layout(input: &str) -> Result<Vec<TcpOption>, SpoofError> {
    if input.is_empty() {
        return Ok(vec![]);
    }

    let mut olayout = vec![];
    for token in input.split(',') {
        olayout.extend(parse_field(token, SignatureField::Option, parse_layout_entry)?);
    }
    Ok(olayout)
}

/// One layout token; `eol+n` is the end-of-options marker followed by n bytes of padding.
fn parse_layout_entry(input: &str) -> IResult<&str, Vec<TcpOption>> {
    alt((
        map(
            preceded(tag("eol+"), map_res(digit1, |s: &str| s.parse::<u32>())),
            |padding| vec![TcpOption::Eol; (padding as usize).saturating_add(1)],
        ),
        map(parse_tcp_option, |option| vec![option]),
    ))
    .parse(input)
}

fn parse_tcp_option(input: &str) -> IResult<&str, TcpOption> {
    alt((
        value(TcpOption::Eol, tag("eol")),
        value(TcpOption::Nop, tag("nop")),
        value(TcpOption::Mss, tag("mss")),
        value(TcpOption::Ws, tag("ws")),
        value(TcpOption::Sok, tag("sok")),
        value(TcpOption::Sack, tag("sack")),
        value(TcpOption::TS, tag("ts")),
    ))
    .parse(input)
}

fn parse_quirks(input: &str) -> Result<Quirks, SpoofError> {
    if input.is_empty() {
        return Ok(Quirks::new());
    }

    input
        .split(',')
        .map(|token| parse_field(token, SignatureField::Quirk, parse_quirk))
        .collect()
}

fn parse_quirk(input: &str) -> IResult<&str, Quirk> {
    alt((
        value(Quirk::Df, tag("df")),
        value(Quirk::NonZeroID, tag("id+")),
        value(Quirk::ZeroID, tag("id-")),
        value(Quirk::Ecn, tag("ecn")),
        value(Quirk::MustBeZero, tag("0+")),
        value(Quirk::FlowID, tag("flow")),
        value(Quirk::SeqNumZero, tag("seq-")),
        value(Quirk::AckNumNonZero, tag("ack+")),
        value(Quirk::AckNumZero, tag("ack-")),
        value(Quirk::NonZeroURG, tag("uptr+")),
        value(Quirk::Urg, tag("urgf+")),
        value(Quirk::Push, tag("pushf+")),
        value(Quirk::OwnTimestampZero, tag("ts1-")),
        value(Quirk::PeerTimestampNonZero, tag("ts2+")),
        value(Quirk::TrailingNonZero, tag("opt+")),
        value(Quirk::ExcessiveWindowScaling, tag("exws")),
        value(Quirk::OptBad, tag("bad")),
    ))
    .parse(input)
}

fn parse_payload_size(input: &str) -> IResult<&str, PayloadSize> {
    alt((
        value(PayloadSize::Zero, tag("0")),
        value(PayloadSize::NonZero, tag("+")),
        value(PayloadSize::Any, tag("*")),
    ))
    .parse(input)
}
