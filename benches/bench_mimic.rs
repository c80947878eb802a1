use criterion::{criterion_group, criterion_main, Criterion};
use huginn_net_mimic::{Disguise, Signature};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::MutableIpv4Packet;
use pnet::packet::tcp::{MutableTcpPacket, TcpFlags};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// Number of packets rewritten per iteration
const PACKET_COUNT: usize = 1000;

const SIGNATURES: [(&str, &str); 4] = [
    ("linux", "*:64:0:*:mss*20,10:mss,sok,ts,nop,ws:df,id+:0"),
    ("windows", "*:128:0:*:8192,8:mss,nop,ws,nop,nop,sok:df,id+:0"),
    ("macos", "*:64:0:*:65535,6:mss,nop,ws,nop,nop,ts,sok,eol+1:df,id+:0"),
    ("freebsd", "*:64:0:*:65535,6:mss,nop,ws,sok,ts:df,id+:0"),
];

criterion_group!(
    mimic_benches,
    bench_signature_parsing,
    bench_packet_rewrite,
    report_throughput
);
criterion_main!(mimic_benches);

/// Linux-style SYN with mss, sok, ts, nop, ws
fn syn_packet(seq: u32) -> Vec<u8> {
    let options = [
        2, 4, 0x05, 0xb4, 4, 2, 8, 10, 0, 0x12, 0x34, 0x56, 0, 0, 0, 0, 1, 3, 3, 7,
    ];
    let total_len = 40 + options.len();
    let mut buf = vec![0u8; total_len];

    if let Some(mut ip) = MutableIpv4Packet::new(&mut buf) {
        ip.set_version(4);
        ip.set_header_length(5);
        ip.set_total_length(total_len as u16);
        ip.set_identification(seq as u16);
        ip.set_ttl(64);
        ip.set_next_level_protocol(IpNextHeaderProtocols::Tcp);
        ip.set_source(Ipv4Addr::new(192, 168, 1, 10));
        ip.set_destination(Ipv4Addr::new(10, 0, 0, 1));
    }
    if let Some(mut tcp) = MutableTcpPacket::new(&mut buf[20..]) {
        tcp.set_source(40000);
        tcp.set_destination(443);
        tcp.set_sequence(seq);
        tcp.set_data_offset(10);
        tcp.set_flags(TcpFlags::SYN);
        tcp.set_window(64240);
    }
    buf[40..].copy_from_slice(&options);
    buf
}

fn bench_signature_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Signature_Parsing");

    for (name, signature) in SIGNATURES {
        group.bench_function(name, |b| {
            b.iter(|| black_box(signature).parse::<Signature>())
        });
    }

    group.finish();
}

fn bench_packet_rewrite(c: &mut Criterion) {
    let packets: Vec<Vec<u8>> = (1..=PACKET_COUNT as u32).map(syn_packet).collect();
    let mut group = c.benchmark_group("Packet_Rewrite");

    for (name, signature) in SIGNATURES {
        let disguise: Disguise = match signature.parse() {
            Ok(disguise) => disguise,
            Err(e) => {
                eprintln!("Failed to parse {name} signature: {e}");
                continue;
            }
        };

        group.bench_function(name, |b| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| {
                for packet in &packets {
                    let _ = black_box(disguise.rewrite_ipv4(packet, &mut rng));
                }
            })
        });
    }

    group.finish();
}

/// Format throughput for display
fn format_throughput(pps: f64) -> String {
    if pps >= 1_000_000.0 {
        format!("{:.2}M", pps / 1_000_000.0)
    } else if pps >= 1_000.0 {
        format!("{:.1}k", pps / 1_000.0)
    } else {
        format!("{pps:.0}")
    }
}

fn report_throughput(_c: &mut Criterion) {
    let packets: Vec<Vec<u8>> = (1..=PACKET_COUNT as u32).map(syn_packet).collect();
    let mut rng = StdRng::seed_from_u64(0);

    println!();
    println!("Packet rewrite throughput ({PACKET_COUNT} SYN packets):");

    for (name, signature) in SIGNATURES {
        let Ok(disguise) = signature.parse::<Disguise>() else {
            continue;
        };

        let start = Instant::now();
        let mut failures: u32 = 0;
        for packet in &packets {
            if disguise.rewrite_ipv4(packet, &mut rng).is_err() {
                failures = failures.saturating_add(1);
            }
        }
        let elapsed = start.elapsed();

        let seconds = elapsed.max(Duration::from_nanos(1)).as_secs_f64();
        println!(
            "  - {name:<8} {} pkt/s ({failures} failed)",
            format_throughput(PACKET_COUNT as f64 / seconds)
        );
    }
}
