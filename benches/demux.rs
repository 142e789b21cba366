//! Demux throughput: Ogg pages to Opus frames
//!
//! Run with: cargo bench --bench demux

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use voice_streamer::codec::OpusStreamReader;
use voice_streamer::ogg::PacketReader;

const SERIAL: u32 = 0x5EED;

fn page(sequence: u32, flags: u8, granule: u64, packets: &[&[u8]]) -> Vec<u8> {
    let mut lacing = Vec::new();
    let mut body = Vec::new();
    for packet in packets {
        let mut remaining = packet.len();
        while remaining >= 255 {
            lacing.push(255u8);
            remaining -= 255;
        }
        lacing.push(remaining as u8);
        body.extend_from_slice(packet);
    }

    let mut out = b"OggS".to_vec();
    out.push(0);
    out.push(flags);
    out.extend_from_slice(&granule.to_le_bytes());
    out.extend_from_slice(&SERIAL.to_le_bytes());
    out.extend_from_slice(&sequence.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.push(lacing.len() as u8);
    out.extend_from_slice(&lacing);
    out.extend_from_slice(&body);
    out
}

/// An Ogg/Opus stream with `frames` frames of `frame_size` bytes, packed
/// several frames to a page the way encoders usually do.
fn stream(frames: usize, frame_size: usize) -> Vec<u8> {
    let mut head = b"OpusHead".to_vec();
    head.extend_from_slice(&[1, 2]);
    head.extend_from_slice(&312u16.to_le_bytes());
    head.extend_from_slice(&48_000u32.to_le_bytes());
    head.extend_from_slice(&[0, 0, 0]);

    let mut tags = b"OpusTags".to_vec();
    tags.extend_from_slice(&5u32.to_le_bytes());
    tags.extend_from_slice(b"bench");
    tags.extend_from_slice(&0u32.to_le_bytes());

    let mut out = page(0, 0x02, 0, &[&head]);
    out.extend(page(1, 0x00, 0, &[&tags]));

    let frame = vec![0xA5u8; frame_size];
    let lacing_per_frame = frame_size / 255 + 1;
    let per_page = (255 / lacing_per_frame).clamp(1, 50);
    let mut sequence = 2;
    let mut written = 0;
    while written < frames {
        let count = per_page.min(frames - written);
        written += count;
        let packets: Vec<&[u8]> = (0..count).map(|_| frame.as_slice()).collect();
        let flags = if written == frames { 0x04 } else { 0x00 };
        out.extend(page(sequence, flags, written as u64 * 960, &packets));
        sequence += 1;
    }
    out
}

fn bench_packets(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let mut group = c.benchmark_group("ogg_packets");

    for frame_size in [80usize, 320, 1275] {
        let data = stream(1000, frame_size);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frame_size), &data, |b, data| {
            b.to_async(&runtime).iter(|| async {
                let mut reader = PacketReader::new(data.as_slice());
                let mut count = 0;
                while let Some(packet) = reader.next_packet().await.unwrap() {
                    count += packet.data.len();
                }
                black_box(count)
            });
        });
    }
    group.finish();
}

fn bench_opus_frames(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let data = stream(3000, 160);

    c.bench_function("opus_stream_1min", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut reader = OpusStreamReader::open(data.as_slice()).await.unwrap();
            while let Some(frame) = reader.next_packet().await.unwrap() {
                black_box(frame);
            }
            black_box(reader.frames_read())
        });
    });
}

criterion_group!(benches, bench_packets, bench_opus_frames);
criterion_main!(benches);
