use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hevc_bitstream::dpb::{Dpb, DpbFrame};
use hevc_bitstream::hevc::sei::{BufferingPeriodSei, InitialCpbRemoval, PicTimingSei};
use hevc_bitstream::hevc::{NAL_TRAIL_N, NAL_TRAIL_R, SLICE_TYPE_B, SLICE_TYPE_P};
use hevc_bitstream::rps::{construct_strps, plan_sequence_rps};
use hevc_bitstream::{HeaderPacker, StreamSettings, Task, VideoParam};

use super::initialize_progress_bar;
use crate::commands::GenerateArgs;

const DEFAULT_OUTPUT: &str = "generated.hevc";

/// 90 kHz clock, half a second of initial buffering
const INITIAL_CPB_REMOVAL_DELAY: u32 = 45_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerateConfig {
    pub width: u32,
    pub height: u32,

    #[serde(flatten)]
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerateOptions {
    pub log2_ctu_size: u32,
    /// Pictures generated after the IRAP picture
    pub frames: u32,
    pub gop_ref_dist: u32,
    pub num_ref_frames: u32,
    pub qp: i32,
    pub slices: u32,
    pub frame_rate_num: u32,
    pub frame_rate_den: u32,

    pub hrd: bool,
    pub bitrate_kbps: u32,
    pub sei: bool,
    pub aud: bool,
}

/// A picture in decoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedPicture {
    pub poc: i32,
    pub slice_type: u8,
    pub reference: bool,
}

pub struct Generator {
    config: GenerateConfig,
    output: PathBuf,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            log2_ctu_size: 6,
            frames: 8,
            gop_ref_dist: 1,
            num_ref_frames: 2,
            qp: 30,
            slices: 1,
            frame_rate_num: 30,
            frame_rate_den: 1,
            hrd: false,
            bitrate_kbps: 5000,
            sei: true,
            aud: true,
        }
    }
}

impl GenerateConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Can't open {}", path.display()))?;

        let config: GenerateConfig = serde_json::from_reader(file)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let opts = &self.options;

        ensure!(
            (16..=8192).contains(&self.width) && (16..=4320).contains(&self.height),
            "Invalid picture size {}x{}",
            self.width,
            self.height
        );
        ensure!(
            (4..=6).contains(&opts.log2_ctu_size),
            "log2_ctu_size must be between 4 and 6"
        );
        ensure!(opts.frames > 0, "At least one frame must be generated");
        ensure!(
            (1..=8).contains(&opts.gop_ref_dist),
            "gop_ref_dist must be between 1 and 8"
        );
        ensure!(
            (1..=15).contains(&opts.num_ref_frames),
            "num_ref_frames must be between 1 and 15"
        );
        ensure!((0..=51).contains(&opts.qp), "qp must be between 0 and 51");
        ensure!(opts.slices > 0, "At least one slice per picture is required");
        ensure!(
            opts.frame_rate_num > 0 && opts.frame_rate_den > 0,
            "Invalid frame rate"
        );

        Ok(())
    }

    pub fn stream_settings(&self) -> StreamSettings {
        let opts = &self.options;

        StreamSettings {
            width: self.width,
            height: self.height,
            log2_ctu_size: opts.log2_ctu_size,
            num_ref_frames: opts.num_ref_frames,
            gop_ref_dist: opts.gop_ref_dist,
            qp: opts.qp,
            frame_rate_num: opts.frame_rate_num,
            frame_rate_den: opts.frame_rate_den,
            hrd: opts.hrd,
            bitrate_kbps: opts.bitrate_kbps,
            ..Default::default()
        }
    }
}

impl Generator {
    pub fn generate(args: GenerateArgs) -> Result<()> {
        let GenerateArgs { config, output } = args;

        let generator = Generator {
            config: GenerateConfig::from_file(config)?,
            output: output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        };

        println!("Generating skip pictures...");
        stdout().flush().ok();

        generator.execute()?;

        println!("Done.");

        Ok(())
    }

    fn execute(&self) -> Result<()> {
        let opts = &self.config.options;
        let settings = self.config.stream_settings();

        let pictures = coding_order(opts.frames, opts.gop_ref_dist);
        let (par, tasks) = plan_tasks(&settings, &pictures, opts.slices);

        let mut packer = HeaderPacker::new(&par);

        let file = File::create(&self.output)
            .with_context(|| format!("Can't create {}", self.output.display()))?;
        let mut writer = BufWriter::with_capacity(100_000, file);

        let pb = initialize_progress_bar(tasks.len() as u64)?;

        for (i, mut task) in tasks.into_iter().enumerate() {
            let first = i == 0;

            if opts.aud {
                writer.write_all(packer.get_aud(&task))?;
            }

            if first {
                writer.write_all(packer.get_vps())?;
                writer.write_all(packer.get_sps())?;
                writer.write_all(packer.get_pps())?;
            }

            if opts.hrd && opts.sei {
                task.insert_bp_sei = first;
                task.insert_pt_sei = true;
                task.bp_sei = buffering_period();
                task.pt_sei = picture_timing(&pictures[i], i, opts.gop_ref_dist);

                writer.write_all(packer.get_prefix_sei(&task)?)?;
            }

            for slice_idx in 0..task.slices.len() {
                let data = packer
                    .get_skip_slice(&task, slice_idx)
                    .with_context(|| format!("POC {}: slice {}", task.poc, slice_idx))?;
                writer.write_all(data)?;
            }

            pb.inc(1);
        }

        writer.flush()?;
        pb.finish_and_clear();

        info!(pictures = pictures.len(), output = %self.output.display(), "Stream written");

        Ok(())
    }
}

/// Decoding order of `frames` pictures following an IRAP at POC 0.
///
/// Every `gop_ref_dist`th picture is a P reference coded first, the pictures
/// before it are non-reference B pictures.
pub fn coding_order(frames: u32, gop_ref_dist: u32) -> Vec<PlannedPicture> {
    let frames = frames as i32;
    let gop_ref_dist = gop_ref_dist.max(1) as i32;

    let mut order = Vec::with_capacity(frames as usize);
    let mut prev_anchor = 0;

    while prev_anchor < frames {
        let anchor = (prev_anchor + gop_ref_dist).min(frames);

        order.push(PlannedPicture {
            poc: anchor,
            slice_type: SLICE_TYPE_P,
            reference: true,
        });
        order.extend((prev_anchor + 1..anchor).map(|poc| PlannedPicture {
            poc,
            slice_type: SLICE_TYPE_B,
            reference: false,
        }));

        prev_anchor = anchor;
    }

    order
}

/// Builds the parameter sets with the sequence RPS plan and one task per picture.
pub fn plan_tasks(
    settings: &StreamSettings,
    pictures: &[PlannedPicture],
    slices: u32,
) -> (VideoParam, Vec<Task>) {
    let num_refs = settings.num_ref_frames as usize;
    let mut dpb = Dpb::new(num_refs);

    // The IRAP picture the generated pictures follow
    dpb.push(DpbFrame::default());

    let rps_list = pictures
        .iter()
        .map(|pic| {
            let num_l1 = if pic.slice_type == SLICE_TYPE_B { num_refs } else { 0 };
            let lists = dpb.ref_lists(pic.poc, num_refs, num_l1);
            let rps = construct_strps(dpb.frames(), &lists, pic.poc);

            if pic.reference {
                dpb.push(DpbFrame {
                    poc: pic.poc,
                    ..Default::default()
                });
            }

            rps
        })
        .collect::<Vec<_>>();

    let plan = plan_sequence_rps(&rps_list);

    let mut par = VideoParam::new(settings);
    par.sps.short_term_ref_pic_sets = plan.sps_sets.clone();

    debug!(
        sets = plan.sps_sets.len(),
        bits = plan.total_bits,
        "Sequence RPS planned"
    );

    let segments = par.split_slices(slices);

    let tasks = pictures
        .iter()
        .enumerate()
        .map(|(i, pic)| {
            let mut slice = par.slice_template(settings, pic.slice_type);
            plan.apply(&mut slice, i);

            Task {
                poc: pic.poc,
                slice_type: pic.slice_type,
                nal_unit_type: if pic.reference { NAL_TRAIL_R } else { NAL_TRAIL_N },
                insert_aud: true,
                slice,
                slices: segments.clone(),
                ..Default::default()
            }
        })
        .collect();

    (par, tasks)
}

fn buffering_period() -> BufferingPeriodSei {
    BufferingPeriodSei {
        nal: vec![InitialCpbRemoval {
            initial_cpb_removal_delay: INITIAL_CPB_REMOVAL_DELAY,
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Removal and output delays in pictures, one clock tick each.
fn picture_timing(pic: &PlannedPicture, decode_idx: usize, gop_ref_dist: u32) -> PicTimingSei {
    let reorder = i64::from(gop_ref_dist > 1);
    let output_idx = i64::from(pic.poc) - 1;
    let dpb_output_delay = (output_idx - decode_idx as i64 + reorder).max(0);

    PicTimingSei {
        au_cpb_removal_delay_minus1: (decode_idx as u32).saturating_sub(1),
        pic_dpb_output_delay: dpb_output_delay as u32,
        ..Default::default()
    }
}
