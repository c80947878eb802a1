use huginn_net_mimic::{spoof_tcp_window, RawTcpOption, Signature, SpoofError, TcpSegment, WindowSize};
use pnet::packet::tcp::{TcpFlags, TcpOptionNumbers};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn segment(window: u16, mss: Option<u16>) -> TcpSegment {
    TcpSegment {
        source: 1234,
        destination: 80,
        sequence: 1,
        acknowledgement: 0,
        flags: TcpFlags::SYN,
        window,
        urgent_ptr: 0,
        options: mss
            .map(|mss| RawTcpOption::new(TcpOptionNumbers::MSS, mss.to_be_bytes().to_vec()))
            .into_iter()
            .collect(),
        payload: vec![],
    }
}

fn window(wsize: &str, segment: &mut TcpSegment, seed: u64) -> Result<u16, SpoofError> {
    let signature: Signature = format!("*:64:0:*:{wsize},*:mss::0").parse().unwrap();
    spoof_tcp_window(segment, &signature, &mut StdRng::seed_from_u64(seed))?;
    Ok(segment.window)
}

#[test]
fn test_mss_multiple() {
    assert_eq!(window("mss*4", &mut segment(0, Some(1460)), 1), Ok(5840));
    assert_eq!(window("mss*44", &mut segment(0, Some(1460)), 1), Ok(64240));
    assert_eq!(
        window("mss*45", &mut segment(0, Some(1460)), 1),
        Err(SpoofError::WindowOverflow {
            wsize: WindowSize::Mss(45),
            mss: 1460
        })
    );
}

#[test]
fn test_mss_multiple_without_mss() {
    assert_eq!(window("mss*4", &mut segment(0, None), 1), Err(SpoofError::MissingMss));
    assert_eq!(window("mtu*4", &mut segment(0, None), 1), Err(SpoofError::MissingMss));
}

#[test]
fn test_mtu_multiple() {
    assert_eq!(window("mtu*3", &mut segment(0, Some(1460)), 1), Ok(4500));
    assert_eq!(
        window("mtu*44", &mut segment(0, Some(1460)), 1),
        Err(SpoofError::WindowOverflow {
            wsize: WindowSize::Mtu(44),
            mss: 1460
        })
    );
}

#[test]
fn test_direct_value() {
    assert_eq!(window("12345", &mut segment(64240, Some(1460)), 1), Ok(12345));
}

#[test]
fn test_any_keeps_window() {
    assert_eq!(window("*", &mut segment(64240, None), 1), Ok(64240));
}

#[test]
fn test_modulo_pattern() {
    assert_eq!(window("%8192", &mut segment(16384, None), 1), Ok(16384));

    for seed in 0..100 {
        let win = window("%8192", &mut segment(64240, None), seed).unwrap();
        assert_eq!(win % 8192, 0);
        assert_ne!(win, 0);

        let win = window("%1024", &mut segment(0, None), seed).unwrap();
        assert_eq!(win % 1024, 0);
        assert_ne!(win, 0);
    }
}
