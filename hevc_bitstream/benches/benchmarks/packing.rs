use criterion::{criterion_group, Criterion};

use hevc_bitstream::bits::BitReader;
use hevc_bitstream::header_reader::read_sps;
use hevc_bitstream::{HeaderPacker, StreamSettings, VideoParam};

const SIZES: &[(&str, u32, u32)] = &[("720p", 1280, 720), ("1080p", 1920, 1080), ("2160p", 3840, 2160)];

fn video_param(width: u32, height: u32) -> VideoParam {
    VideoParam::new(&StreamSettings {
        width,
        height,
        hrd: true,
        ..Default::default()
    })
}

fn pack_parameter_sets_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_parameter_sets");

    for (name, width, height) in SIZES {
        let par = video_param(*width, *height);

        group.bench_function(*name, |b| b.iter(|| HeaderPacker::new(&par).get_sps().len()));
    }
}

fn parse_sps_benchmark(c: &mut Criterion) {
    let par = video_param(1920, 1080);
    let sps = HeaderPacker::new(&par).get_sps().to_vec();

    c.bench_function("parse_sps", |b| {
        b.iter(|| read_sps(&mut BitReader::new(&sps)).unwrap())
    });
}

criterion_group!(pack_headers, pack_parameter_sets_benchmark, parse_sps_benchmark);
