use huginn_net_mimic::{
    Disguise, IpVersion, PayloadSize, Quirk, Quirks, Signature, SignatureField, SpoofError,
    TcpOption, WindowSize,
};

#[test]
fn test_literal_mss_in_example_signature() {
    let sig: Signature = "*:64:*:65535:*,0::df:0".parse().unwrap();

    assert_eq!(sig.version, IpVersion::Any);
    assert_eq!(sig.ittl, 64);
    assert_eq!(sig.mss, Some(65535));
    assert_eq!(sig.wsize, WindowSize::Any);
    assert_eq!(sig.wscale, Some(0));
    assert!(sig.olayout.is_empty());
    assert_eq!(sig.quirks, [Quirk::Df].into_iter().collect::<Quirks>());
    assert_eq!(sig.pclass, PayloadSize::Zero);
}

#[test]
fn test_field_count() {
    for s in [
        "",
        "*:64:0:*:*,0::",
        "*:64:0:*:*,0:::0:extra",
        "4:64:0:*:mss*10,6:mss,sok,ts,nop,ws:df,id+",
    ] {
        assert_eq!(
            s.parse::<Signature>(),
            Err(SpoofError::InvalidSignature(s.to_string())),
            "{s}"
        );
    }
}

#[test]
fn test_errors_name_the_field() {
    let cases = [
        ("5:64:0:*:*,0::df:0", SignatureField::IpVersion, "5"),
        ("*:0:0:*:*,0::df:0", SignatureField::InitialTtl, "0"),
        ("*:64:0:1048576:*,0::df:0", SignatureField::MaximumSegmentSize, "1048576"),
        ("*:64:0:*:65536,*::df:0", SignatureField::WindowSize, "65536,*"),
        ("*:64:0:*:*,0:mss,foo::0", SignatureField::Option, "foo"),
        ("*:64:0:*:*,0:eol+:df:0", SignatureField::Option, "eol+"),
        ("*:64:0:*:*,0::df,bogus:0", SignatureField::Quirk, "bogus"),
        ("*:64:0:*:*,0::df:1", SignatureField::PayloadSize, "1"),
    ];

    for (s, field, value) in cases {
        assert_eq!(
            s.parse::<Signature>(),
            Err(SpoofError::InvalidField {
                field,
                value: value.to_string()
            }),
            "{s}"
        );
    }
}

#[test]
fn test_olen_slot_is_ignored() {
    let a: Signature = "4:64:0:*:mss*10,6:mss,sok,ts,nop,ws:df,id+:0".parse().unwrap();
    let b: Signature = "4:64:anything:*:mss*10,6:mss,sok,ts,nop,ws:df,id+:0"
        .parse()
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_eol_padding() {
    let sig: Signature = "*:64:0:*:*,0:mss,eol+0::0".parse().unwrap();
    assert_eq!(sig.olayout, vec![TcpOption::Mss, TcpOption::Eol]);

    let sig: Signature = "*:64:0:*:*,0:nop,eol+3::0".parse().unwrap();
    assert_eq!(
        sig.olayout,
        vec![
            TcpOption::Nop,
            TcpOption::Eol,
            TcpOption::Eol,
            TcpOption::Eol,
            TcpOption::Eol
        ]
    );
}

#[test]
fn test_whole_quirk_vocabulary() {
    let tokens = "df,id+,id-,ecn,0+,flow,seq-,ack+,ack-,uptr+,urgf+,pushf+,ts1-,ts2+,opt+,exws,bad";
    let sig: Signature = format!("*:64:0:*:*,0::{tokens}:0").parse().unwrap();

    assert_eq!(sig.quirks.len(), Quirk::ALL.len());
    for quirk in Quirk::ALL {
        assert!(sig.has_quirk(quirk), "{quirk:?}");
    }
    assert_eq!(sig.quirks.to_string(), tokens);
}

#[test]
fn test_display_round_trip() {
    for s in [
        "4:64:*:*:mss*10,6:mss,sok,ts,nop,ws:df,id+:0",
        "*:128:*:1460:8192,8:mss,nop,ws,nop,nop,sok:df,id+:0",
        "*:64:*:*:%8192,*:mss,nop,nop,ts,eol+2:ecn,seq-:+",
        "6:255:*:1220:mtu*4,0::flow:*",
    ] {
        let sig: Signature = s.parse().unwrap();
        assert_eq!(sig.to_string(), s);
        assert_eq!(sig.to_string().parse::<Signature>().unwrap(), sig);
    }
}

#[test]
fn test_single_values_from_str() {
    assert_eq!("mss*4".parse::<WindowSize>(), Ok(WindowSize::Mss(4)));
    assert_eq!("sok".parse::<TcpOption>(), Ok(TcpOption::Sok));
    assert_eq!("exws".parse::<Quirk>(), Ok(Quirk::ExcessiveWindowScaling));
    assert_eq!("+".parse::<PayloadSize>(), Ok(PayloadSize::NonZero));
    assert_eq!("6".parse::<IpVersion>(), Ok(IpVersion::V6));
    assert!("ws,".parse::<TcpOption>().is_err());
}

#[test]
fn test_disguise_from_str() {
    let disguise: Disguise = "4:64:0:*:mss*10,6:mss,sok,ts,nop,ws:df,id+:0"
        .parse()
        .unwrap();

    assert_eq!(disguise.signature().wsize, WindowSize::Mss(10));
    assert!("not a signature".parse::<Disguise>().is_err());
}
