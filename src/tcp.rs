/// A parsed p0f TCP signature.
///
/// Built once by the parser and read-only afterwards. The IPv4 options length
/// slot of the text format is accepted but not modeled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub version: IpVersion,
    /// initial TTL used by the OS.
    pub ittl: u32,
    /// maximum segment size, `None` when the signature uses a wildcard.
    pub mss: Option<u32>,
    /// window size.
    pub wsize: WindowSize,
    /// window scaling factor, `None` when the signature uses a wildcard.
    pub wscale: Option<u32>,
    /// layout and ordering of TCP options, if any.
    pub olayout: Vec<TcpOption>,
    /// properties and quirks of IP or TCP headers to reproduce.
    pub quirks: Quirks,
    /// payload size classification
    pub pclass: PayloadSize,
}

impl Signature {
    pub fn has_quirk(&self, quirk: Quirk) -> bool {
        self.quirks.contains(quirk)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
    Any,
}

/// TCP Window Size representation used by the different TCP stacks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowSize {
    /// Window size is a multiple of MSS (Maximum Segment Size)
    /// The u16 value represents the multiplier (e.g., Mss(4) means window = MSS * 4)
    Mss(u16),

    /// Window size is a multiple of MTU (Maximum Transmission Unit)
    /// The u16 value represents the multiplier (e.g., Mtu(4) means window = MTU * 4)
    Mtu(u16),

    /// Literal window size value
    Value(u16),

    /// Window size follows a modulo pattern
    /// The u16 value represents the modulo base (e.g., Mod(1024) means window % 1024 == 0)
    Mod(u16),

    /// Represents any window size (wildcard)
    Any,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TcpOption {
    /// eol    - explicit end of options; `eol+n` expands to n+1 of these
    Eol,
    /// nop    - no-op option
    Nop,
    /// mss    - maximum segment size
    Mss,
    /// ws     - window scaling
    Ws,
    /// sok    - selective ACK permitted
    Sok,
    /// sack   - selective ACK (should not be seen)
    Sack,
    /// ts     - timestamp
    TS,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quirk {
    /// df     - "don't fragment" set (probably PMTUD); ignored for IPv6
    Df,
    /// id+    - DF set but IPID non-zero; ignored for IPv6
    NonZeroID,
    /// id-    - DF not set but IPID is zero; ignored for IPv6
    ZeroID,
    /// ecn    - explicit congestion notification support
    Ecn,
    /// 0+     - "must be zero" field not zero; ignored for IPv6
    MustBeZero,
    /// flow   - non-zero IPv6 flow ID; ignored for IPv4
    FlowID,
    /// seq-   - sequence number is zero
    SeqNumZero,
    /// ack+   - ACK number is non-zero, but ACK flag not set
    AckNumNonZero,
    /// ack-   - ACK number is zero, but ACK flag set
    AckNumZero,
    /// uptr+  - URG pointer is non-zero, but URG flag not set
    NonZeroURG,
    /// urgf+  - URG flag used
    Urg,
    /// pushf+ - PUSH flag used
    Push,
    /// ts1-   - own timestamp specified as zero
    OwnTimestampZero,
    /// ts2+   - non-zero peer timestamp on initial SYN
    PeerTimestampNonZero,
    /// opt+   - trailing non-zero data in options segment
    TrailingNonZero,
    /// exws   - excessive window scaling factor (> 14)
    ExcessiveWindowScaling,
    /// bad    - malformed TCP options
    OptBad,
}

impl Quirk {
    /// Every quirk, in the order p0f lists them.
    pub const ALL: [Quirk; 17] = [
        Quirk::Df,
        Quirk::NonZeroID,
        Quirk::ZeroID,
        Quirk::Ecn,
        Quirk::MustBeZero,
        Quirk::FlowID,
        Quirk::SeqNumZero,
        Quirk::AckNumNonZero,
        Quirk::AckNumZero,
        Quirk::NonZeroURG,
        Quirk::Urg,
        Quirk::Push,
        Quirk::OwnTimestampZero,
        Quirk::PeerTimestampNonZero,
        Quirk::TrailingNonZero,
        Quirk::ExcessiveWindowScaling,
        Quirk::OptBad,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Set of quirks carried by a signature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Quirks(u32);

impl Quirks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quirk: Quirk) {
        self.0 |= quirk.bit();
    }

    pub fn contains(&self, quirk: Quirk) -> bool {
        self.0 & quirk.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the set members in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = Quirk> + '_ {
        Quirk::ALL.into_iter().filter(move |q| self.contains(*q))
    }
}

impl FromIterator<Quirk> for Quirks {
    fn from_iter<I: IntoIterator<Item = Quirk>>(iter: I) -> Self {
        let mut quirks = Quirks::new();
        for quirk in iter {
            quirks.insert(quirk);
        }
        quirks
    }
}

/// Classification of TCP payload sizes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadSize {
    /// Packet has no payload (empty)
    /// Common in SYN packets and some control messages
    Zero,

    /// Packet contains data in the payload
    NonZero,

    /// Matches any payload size
    Any,
}
