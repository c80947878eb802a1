use core::fmt;

use crate::tcp::{IpVersion, PayloadSize, Quirk, Quirks, Signature, TcpOption, WindowSize};

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:*:", self.version, self.ittl)?;

        if let Some(mss) = self.mss {
            write!(f, "{}", mss)?;
        } else {
            f.write_str("*")?;
        }

        write!(f, ":{},", self.wsize)?;

        if let Some(scale) = self.wscale {
            write!(f, "{}", scale)?;
        } else {
            f.write_str("*")?;
        }

        f.write_str(":")?;
        write_olayout(f, &self.olayout)?;

        write!(f, ":{}:{}", self.quirks, self.pclass)
    }
}

/// Writes the layout, folding every run of EOL entries back into `eol+n`.
fn write_olayout(f: &mut fmt::Formatter, olayout: &[TcpOption]) -> fmt::Result {
    let mut i = 0;
    let mut first = true;

    while i < olayout.len() {
        if !first {
            f.write_str(",")?;
        }
        first = false;

        if olayout[i] == TcpOption::Eol {
            let run = olayout[i..]
                .iter()
                .take_while(|o| **o == TcpOption::Eol)
                .count();
            write!(f, "eol+{}", run - 1)?;
            i += run;
        } else {
            write!(f, "{}", olayout[i])?;
            i += 1;
        }
    }

    Ok(())
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use IpVersion::*;

        f.write_str(match self {
            V4 => "4",
            V6 => "6",
            Any => "*",
        })
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use WindowSize::*;

        match self {
            Mss(n) => write!(f, "mss*{}", n),
            Mtu(n) => write!(f, "mtu*{}", n),
            Value(n) => write!(f, "{}", n),
            Mod(n) => write!(f, "%{}", n),
            Any => f.write_str("*"),
        }
    }
}

impl fmt::Display for TcpOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TcpOption::*;

        f.write_str(match self {
            Eol => "eol",
            Nop => "nop",
            Mss => "mss",
            Ws => "ws",
            Sok => "sok",
            Sack => "sack",
            TS => "ts",
        })
    }
}

impl fmt::Display for Quirk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Quirk::*;

        f.write_str(match self {
            Df => "df",
            NonZeroID => "id+",
            ZeroID => "id-",
            Ecn => "ecn",
            MustBeZero => "0+",
            FlowID => "flow",
            SeqNumZero => "seq-",
            AckNumNonZero => "ack+",
            AckNumZero => "ack-",
            NonZeroURG => "uptr+",
            Urg => "urgf+",
            Push => "pushf+",
            OwnTimestampZero => "ts1-",
            PeerTimestampNonZero => "ts2+",
            TrailingNonZero => "opt+",
            ExcessiveWindowScaling => "exws",
            OptBad => "bad",
        })
    }
}

impl fmt::Display for Quirks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, q) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }

            write!(f, "{}", q)?;
        }

        Ok(())
    }
}

impl fmt::Display for PayloadSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use PayloadSize::*;

        f.write_str(match self {
            Zero => "0",
            NonZero => "+",
            Any => "*",
        })
    }
}
