use criterion::{criterion_group, Criterion};

use hevc_bitstream::hevc::short_term_rps::ShortTermRps;
use hevc_bitstream::hevc::{NAL_TRAIL_R, SLICE_TYPE_P};
use hevc_bitstream::{HeaderPacker, StreamSettings, Task, VideoParam};

fn p_task(par: &VideoParam, settings: &StreamSettings, slices: u32) -> Task {
    let mut slice = par.slice_template(settings, SLICE_TYPE_P);
    slice.strps = ShortTermRps::from_pictures([(-1, true)]);

    Task {
        poc: 1,
        slice_type: SLICE_TYPE_P,
        nal_unit_type: NAL_TRAIL_R,
        slice,
        slices: par.split_slices(slices),
        ..Default::default()
    }
}

fn skip_slice_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("skip_picture_1080p");

    for log2_ctu_size in [4, 5, 6] {
        let settings = StreamSettings {
            log2_ctu_size,
            ..Default::default()
        };
        let par = VideoParam::new(&settings);
        let task = p_task(&par, &settings, 1);

        let mut packer = HeaderPacker::new(&par);

        group.bench_function(format!("ctu{}", 1 << log2_ctu_size), |b| {
            b.iter(|| packer.get_skip_slice(&task, 0).unwrap().len())
        });
    }
}

fn multi_slice_benchmark(c: &mut Criterion) {
    let settings = StreamSettings::default();
    let par = VideoParam::new(&settings);
    let task = p_task(&par, &settings, 8);

    let mut packer = HeaderPacker::new(&par);

    c.bench_function("skip_picture_1080p_8_slices", |b| {
        b.iter(|| {
            (0..task.slices.len())
                .map(|idx| packer.get_skip_slice(&task, idx).unwrap().len())
                .sum::<usize>()
        })
    });
}

criterion_group!(pack_skip_slices, skip_slice_benchmark, multi_slice_benchmark);
