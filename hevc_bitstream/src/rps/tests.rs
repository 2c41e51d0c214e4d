use anyhow::Result;

use super::*;
use crate::dpb::Dpb;

fn all_used(delta_pocs: &[i16]) -> ShortTermRps {
    ShortTermRps::from_pictures(delta_pocs.iter().map(|d| (*d, true)))
}

#[test]
fn explicit_bits() {
    // ue(1) + ue(0) + ue(0) + flag
    assert_eq!(nbits(&all_used(&[-1]), 0, 1), 6);
    // + inter_ref_pic_set_prediction_flag
    assert_eq!(nbits(&all_used(&[-1]), 1, 2), 7);

    // ue(2) + ue(1) + (ue(0) + 1) * 2 + (ue(1) + 1)
    assert_eq!(nbits(&all_used(&[-1, -2, 2]), 0, 1), 3 + 3 + 4 + 4);
}

#[test]
fn sps_set_predicted_from_previous() {
    let sets = vec![all_used(&[-1])];
    let mut rps = all_used(&[-1, -2]);

    assert_eq!(nbits(&rps, 1, 2), 9);
    optimize_strps(&sets, 2, &mut rps, 1);

    assert!(rps.inter_ref_pic_set_prediction_flag);
    assert_eq!(rps.delta_idx_minus1, 0);
    assert_eq!(rps.delta_rps(), -1);
    assert_eq!(
        rps.inter,
        vec![
            InterRpsFlags {
                used_by_curr_pic_flag: true,
                use_delta_flag: true
            };
            2
        ]
    );
    assert_eq!(nbits(&rps, 1, 2), 5);
    assert!(rps.same_pictures(&all_used(&[-1, -2])));
}

#[test]
fn sps_set_only_predicts_from_previous() {
    // Set 0 would predict set 2, but SPS sets can only use set 1
    let sets = vec![all_used(&[-10, -20, -30, -40]), all_used(&[-1])];
    let mut rps = all_used(&[-11, -21, -31, -41]);
    let before = rps.clone();

    optimize_strps(&sets, 3, &mut rps, 2);
    assert_eq!(rps, before);

    // The same set in a slice header reaches back to set 0
    optimize_strps(&sets, 2, &mut rps, 2);
    assert!(rps.inter_ref_pic_set_prediction_flag);
    assert_eq!(rps.delta_idx_minus1, 1);
    assert_eq!(rps.delta_rps(), -1);
    assert!(rps.same_pictures(&before));
}

#[test]
fn prediction_keeps_unused_pictures() {
    let sets = vec![all_used(&[-1, -2, 1])];
    let target = ShortTermRps::from_pictures([(-1, true), (-2, false), (-3, true)]);
    let mut rps = target.clone();

    optimize_strps(&sets, 1, &mut rps, 1);

    assert!(rps.same_pictures(&target));

    if rps.inter_ref_pic_set_prediction_flag {
        let derived = derive_inter_rps(&sets[0], rps.delta_rps(), &rps.inter).unwrap();
        assert!(derived.same_pictures(&target));
        assert!(nbits(&rps, 1, 1) < nbits(&target, 1, 1));
    }
}

#[test]
fn optimization_never_costs_more() {
    let mut seed = 0x2545_F491u32;
    let mut next = move || {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
        (seed >> 16) & 0x7FFF
    };

    let mut sets: Vec<ShortTermRps> = Vec::new();

    for _ in 0..40 {
        let count = next() % 6;
        let pics: Vec<(i16, bool)> = (0..count)
            .map(|_| ((next() % 17) as i16 - 8, next() % 3 != 0))
            .collect();

        let target = ShortTermRps::from_pictures(pics);
        let idx = sets.len();

        for num_sets in [idx + 1, idx] {
            let mut rps = target.clone();
            optimize_strps(&sets, num_sets, &mut rps, idx);

            assert!(nbits(&rps, idx, num_sets) <= nbits(&target, idx, num_sets));
            assert!(rps.same_pictures(&target));
        }

        sets.push(target);
    }
}

/// One dominant set followed by rare sets that are all cheap to predict
/// from it once they are coded in slice headers.
fn scenario_sets() -> Vec<RpsEntry> {
    let pictures: [&[i16]; 10] = [
        &[-1, -2, -3, -4, -5, -6, -7, -8],
        &[-4, -5, -6, -7, -8, -9],
        &[-3, -5, -6, -7, -8, -9],
        &[-3, -4, -6, -7, -8, -9],
        &[-3, -4, -5, -7, -8, -9],
        &[-3, -4, -5, -6, -8, -9],
        &[-3, -4, -5, -6, -7, -9],
        &[-3, -4, -5, -6, -7, -8],
        &[-2, -5, -6, -7, -8, -9],
        &[-2, -4, -6, -7, -8, -9],
    ];
    let counts = [100, 1, 1, 1, 1, 1, 1, 1, 1, 1];

    pictures
        .iter()
        .zip(counts)
        .map(|(pocs, num_slices)| RpsEntry {
            rps: all_used(pocs),
            num_slices,
        })
        .collect()
}

#[test]
fn rare_predictable_sets_leave_sps() {
    let mut sets = scenario_sets();
    let last = sets[9].rps.clone();

    let keep_all = sequence_bits(&sets, sets.len());

    let total = reduce_strps(&mut sets);

    assert_eq!(sets.len(), 1);
    assert!(!sets.iter().any(|e| e.rps.same_pictures(&last)));
    assert!(total * 2 <= keep_all);
    assert_eq!(total, sequence_bits(&scenario_sets(), sets.len()));

    // Coded inline, the last set is predicted from set 0 with DeltaRps -1
    let sps = vec![sets[0].rps.to_explicit()];
    let mut inline = last.to_explicit();
    optimize_strps(&sps, 1, &mut inline, 1);

    assert!(inline.inter_ref_pic_set_prediction_flag);
    assert_eq!(inline.delta_idx_minus1, 0);
    assert_eq!(inline.delta_rps(), -1);
    assert!(inline.same_pictures(&last));
    assert_eq!(nbits(&inline, 1, 1), 16);
    assert!(nbits(&inline, 1, 1) < nbits(&last, 1, 1));
}

#[test]
fn frequent_sets_stay_resident() {
    let mut sets = vec![
        RpsEntry {
            rps: all_used(&[-1, -2]),
            num_slices: 500,
        },
        RpsEntry {
            rps: all_used(&[-1]),
            num_slices: 400,
        },
    ];

    reduce_strps(&mut sets);
    assert_eq!(sets.len(), 2);
}

#[test]
fn construct_from_dpb() {
    let mut dpb = Dpb::new(3);

    for poc in [0, 4, 8] {
        dpb.push(DpbFrame {
            poc,
            ..Default::default()
        });
    }

    let lists = dpb.ref_lists(12, 2, 0);
    let rps = construct_strps(dpb.frames(), &lists, 12);

    assert_eq!(rps.num_negative_pics, 3);
    assert_eq!(rps.num_positive_pics, 0);

    let pics: Vec<(i16, bool, u16)> = rps
        .pics
        .iter()
        .map(|p| (p.delta_poc, p.used_by_curr_pic_flag, p.delta_poc_minus1))
        .collect();
    assert_eq!(pics, vec![(-4, true, 3), (-8, true, 3), (-12, false, 3)]);
}

#[test]
fn construct_skips_long_term() {
    let dpb = [
        DpbFrame {
            poc: 0,
            long_term: true,
            ..Default::default()
        },
        DpbFrame {
            poc: 16,
            ..Default::default()
        },
        DpbFrame {
            poc: 32,
            ..Default::default()
        },
    ];
    let lists = RefLists {
        l0: vec![16],
        l1: vec![32],
    };

    let rps = construct_strps(&dpb, &lists, 24);

    assert_eq!(rps.negative().len(), 1);
    assert_eq!(rps.positive().len(), 1);
    assert_eq!(rps.pics[0].delta_poc, -8);
    assert_eq!(rps.pics[1].delta_poc, 8);
    assert_eq!(rps.pics[1].delta_poc_minus1, 7);
}

#[test]
fn construct_skips_out_of_range_distance() {
    let dpb = [
        DpbFrame {
            poc: 40_000,
            ..Default::default()
        },
        DpbFrame {
            poc: 99_990,
            ..Default::default()
        },
        DpbFrame {
            poc: 99_998,
            ..Default::default()
        },
    ];
    let lists = RefLists {
        l0: vec![40_000, 99_998],
        l1: vec![],
    };

    let rps = construct_strps(&dpb, &lists, 100_000);

    let pics: Vec<(i16, bool)> = rps
        .pics
        .iter()
        .map(|p| (p.delta_poc, p.used_by_curr_pic_flag))
        .collect();
    assert_eq!(pics, vec![(-2, true), (-10, false)]);
}

#[test]
fn plan_resolves_every_picture() -> Result<()> {
    let mut dpb = Dpb::new(2);
    let mut pictures = Vec::new();

    dpb.push(DpbFrame::default());

    for poc in 1..30 {
        let lists = dpb.ref_lists(poc, 2, 0);
        pictures.push(construct_strps(dpb.frames(), &lists, poc));

        dpb.push(DpbFrame {
            poc,
            ..Default::default()
        });
    }

    let plan = plan_sequence_rps(&pictures);

    assert_eq!(plan.pictures.len(), pictures.len());
    assert!(!plan.sps_sets.is_empty());

    // Steady state {-1, -2} is the most used set
    assert!(plan.sps_sets[0].same_pictures(&all_used(&[-1, -2])));

    for (choice, rps) in plan.pictures.iter().zip(&pictures) {
        match choice {
            RpsChoice::Sps(idx) => assert!(plan.sps_sets[*idx].same_pictures(rps)),
            RpsChoice::Inline(inline) => assert!(inline.same_pictures(rps)),
        }
    }

    let mut slice = Slice::default();
    plan.apply(&mut slice, 10);
    assert!(slice.short_term_ref_pic_set_sps_flag);
    assert_eq!(slice.short_term_ref_pic_set_idx, 0);

    Ok(())
}
