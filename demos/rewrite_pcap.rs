use clap::Parser;
use huginn_net_mimic::{Disguise, SpoofError};
use pcap_file::pcap::{PcapPacket, PcapReader, PcapWriter};
use pcap_file::DataLink;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::tcp::{TcpFlags, TcpPacket};
use pnet::packet::Packet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fs::File;
use std::net::Ipv4Addr;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Ethernet II header
const ETHERNET_HEADER_LEN: usize = 14;

#[derive(Parser, Debug)]
#[command(version, about = "Rewrite the IPv4/TCP packets of a capture to match a p0f signature", long_about = None)]
struct Args {
    /// Input pcap file (Ethernet link type)
    #[arg(short = 'i', long)]
    input: String,

    /// Output pcap file
    #[arg(short = 'o', long)]
    output: String,

    /// p0f TCP signature, e.g. "*:64:0:*:mss*20,10:mss,sok,ts,nop,ws:df,id+:0"
    #[arg(short = 's', long)]
    signature: String,

    /// Only rewrite packets sent from this address
    #[arg(long)]
    source: Option<Ipv4Addr>,

    /// Only rewrite SYN packets
    #[arg(long)]
    syn_only: bool,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Default)]
struct Stats {
    total: u64,
    rewritten: u64,
    skipped: u64,
    failed: u64,
}

fn initialize_logging() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set subscriber: {e}");
        std::process::exit(1);
    }
}

fn main() {
    let args = Args::parse();
    initialize_logging();

    if let Err(e) = run(&args) {
        error!("Rewrite failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let disguise: Disguise = args.signature.parse()?;
    info!("Using signature {}", disguise.signature());

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut reader = PcapReader::new(File::open(&args.input)?)?;
    let header = reader.header();
    if header.datalink != DataLink::ETHERNET {
        return Err(format!("unsupported link type {:?}", header.datalink).into());
    }
    let mut writer = PcapWriter::with_header(File::create(&args.output)?, header)?;

    let mut stats = Stats::default();
    while let Some(packet) = reader.next_packet() {
        let packet = packet?;
        stats.total = stats.total.saturating_add(1);

        let frame = match rewrite_frame(&packet.data, &disguise, args, &mut rng) {
            Ok(Some(frame)) => {
                stats.rewritten = stats.rewritten.saturating_add(1);
                frame
            }
            Ok(None) => {
                stats.skipped = stats.skipped.saturating_add(1);
                packet.data.to_vec()
            }
            Err(e) => {
                warn!("Packet {} left unchanged: {e}", stats.total);
                stats.failed = stats.failed.saturating_add(1);
                packet.data.to_vec()
            }
        };

        let orig_len = u32::try_from(frame.len())?;
        writer.write_packet(&PcapPacket::new(packet.timestamp, orig_len, &frame))?;
    }

    info!(
        "Processed {} packets: {} rewritten, {} skipped, {} failed",
        stats.total, stats.rewritten, stats.skipped, stats.failed
    );
    Ok(())
}

/// Returns `None` for frames the filters leave alone.
fn rewrite_frame(
    frame: &[u8],
    disguise: &Disguise,
    args: &Args,
    rng: &mut StdRng,
) -> Result<Option<Vec<u8>>, SpoofError> {
    let Some(ethernet) = EthernetPacket::new(frame) else {
        return Ok(None);
    };
    if ethernet.get_ethertype() != EtherTypes::Ipv4 {
        return Ok(None);
    }

    let Some(ip) = Ipv4Packet::new(ethernet.payload()) else {
        return Ok(None);
    };
    if ip.get_next_level_protocol() != IpNextHeaderProtocols::Tcp {
        return Ok(None);
    }
    if args.source.is_some_and(|source| ip.get_source() != source) {
        return Ok(None);
    }
    if args.syn_only {
        let is_syn = TcpPacket::new(ip.payload())
            .map(|tcp| tcp.get_flags() & (TcpFlags::SYN | TcpFlags::ACK) == TcpFlags::SYN)
            .unwrap_or(false);
        if !is_syn {
            return Ok(None);
        }
    }

    let rewritten = disguise.rewrite_ipv4(ethernet.payload(), rng)?;
    debug!(
        "{} -> {}: {} bytes",
        ip.get_source(),
        ip.get_destination(),
        rewritten.len()
    );

    let mut out = Vec::with_capacity(ETHERNET_HEADER_LEN + rewritten.len());
    out.extend_from_slice(&frame[..ETHERNET_HEADER_LEN]);
    out.extend_from_slice(&rewritten);
    Ok(Some(out))
}
