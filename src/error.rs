use crate::tcp::{TcpOption, WindowSize};
use core::fmt;
use thiserror::Error;

/// Field of a p0f TCP signature, used to point at the part that failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureField {
    IpVersion,
    InitialTtl,
    MaximumSegmentSize,
    WindowSize,
    Option,
    Quirk,
    PayloadSize,
}

impl fmt::Display for SignatureField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SignatureField::IpVersion => "IP version",
            SignatureField::InitialTtl => "initial TTL value",
            SignatureField::MaximumSegmentSize => "maximum segment size value",
            SignatureField::WindowSize => "window size format",
            SignatureField::Option => "option",
            SignatureField::Quirk => "quirk",
            SignatureField::PayloadSize => "payload size value",
        })
    }
}

/// Error handling for signature parsing and packet rewriting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpoofError {
    /// The signature does not split into exactly eight colon-delimited fields.
    #[error("invalid signature '{0}'")]
    InvalidSignature(String),

    /// A single field, or a token inside the options/quirks lists, failed to parse.
    #[error("invalid {field} '{value}'")]
    InvalidField { field: SignatureField, value: String },

    /// The window is MSS- or MTU-relative but no MSS option was produced.
    #[error("TCP window value requires MSS, but MSS option is not set on packet")]
    MissingMss,

    /// A literal MSS does not fit the 2-byte option payload.
    #[error("MSS value {0} does not fit into the TCP option")]
    MssOutOfRange(u32),

    /// A literal window scale does not fit the 1-byte option payload.
    #[error("window scale {0} does not fit into the TCP option")]
    WindowScaleOutOfRange(u32),

    /// The computed window does not fit the 16-bit window field.
    #[error("window {wsize} with MSS {mss} overflows the TCP window field")]
    WindowOverflow { wsize: WindowSize, mss: u16 },

    /// The options layout contains a kind that cannot be synthesized.
    #[error("unsupported TCP option in layout: {0}")]
    UnsupportedOption(TcpOption),

    /// The raw packet could not be decoded or re-assembled.
    #[error("Invalid packet: {0}")]
    Packet(String),
}

impl SpoofError {
    pub(crate) fn field(field: SignatureField, value: &str) -> Self {
        SpoofError::InvalidField {
            field,
            value: value.to_string(),
        }
    }
}
