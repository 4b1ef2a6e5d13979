//! Property-based tests for the restoration stages.

use frame_restore::core::video::{
    AnomalyDetector, ChainReconstructor, DistanceMatrix, Frame, MeanAbsMetric,
    PairwiseDistanceBuilder, SimilarityMetric, SimilarityProfile, Ssim, ThresholdPolicy,
};
use proptest::prelude::*;

/// Square matrix with random upper triangle in [0, 2].
fn distance_matrix(max_size: usize) -> impl Strategy<Value = DistanceMatrix> {
    (0..=max_size).prop_flat_map(|m| {
        prop::collection::vec(0.0f64..2.0, m * m).prop_map(move |cells| {
            let rows: Vec<Vec<f64>> = cells.chunks(m.max(1)).take(m).map(|r| r.to_vec()).collect();
            DistanceMatrix::from_rows(&rows).unwrap()
        })
    })
}

fn frames(count: usize, width: u32, height: u32) -> impl Strategy<Value = Vec<Frame>> {
    let len = (width * height * 3) as usize;
    prop::collection::vec(prop::collection::vec(any::<u8>(), len), count).prop_map(move |bufs| {
        bufs.into_iter()
            .enumerate()
            .map(|(i, data)| Frame::new(width, height, 3, data, i as u64).unwrap())
            .collect()
    })
}

proptest! {
    /// The reconstructed order is a permutation of 0..M.
    #[test]
    fn ordering_is_permutation(d in distance_matrix(24)) {
        let mut order = ChainReconstructor::new().reconstruct(&d);
        prop_assert_eq!(order.len(), d.size());
        order.sort_unstable();
        prop_assert_eq!(order, (0..d.size()).collect::<Vec<_>>());
    }

    /// Same matrix, same order.
    #[test]
    fn reconstruction_is_deterministic(d in distance_matrix(24)) {
        let reconstructor = ChainReconstructor::new();
        prop_assert_eq!(reconstructor.reconstruct(&d), reconstructor.reconstruct(&d));
    }

    /// The path always starts from the globally closest pair.
    #[test]
    fn seed_pair_is_adjacent_in_output(d in distance_matrix(16)) {
        prop_assume!(d.size() >= 2);
        let (a, b) = ChainReconstructor::seed_pair(&d).unwrap();
        let order = ChainReconstructor::new().reconstruct(&d);
        let pa = order.iter().position(|&x| x == a).unwrap();
        let pb = order.iter().position(|&x| x == b).unwrap();
        prop_assert_eq!(pa + 1, pb);
    }

    /// Built matrices are symmetric with a zero diagonal.
    #[test]
    fn built_matrix_is_symmetric(frames in frames(6, 5, 4)) {
        let d = PairwiseDistanceBuilder::new(&MeanAbsMetric).build(&frames).unwrap();
        prop_assert!(d.is_symmetric());
        for i in 0..d.size() {
            prop_assert_eq!(d.get(i, i), 0.0);
            for j in 0..d.size() {
                prop_assert!(d.get(i, j) >= 0.0);
            }
        }
    }

    /// SSIM is symmetric and bounded.
    #[test]
    fn ssim_symmetric(pair in frames(2, 12, 12)) {
        let ssim = Ssim::default();
        let ab = ssim.similarity(&pair[0], &pair[1]).unwrap();
        let ba = ssim.similarity(&pair[1], &pair[0]).unwrap();
        prop_assert_eq!(ab, ba);
        prop_assert!((-1.0..=1.0 + 1e-9).contains(&ab));
    }

    /// A larger stddev never flags more frames.
    #[test]
    fn wider_stddev_flags_fewer(
        samples in prop::collection::vec(0.0f64..1.0, 1..64),
        s1 in 0.0f64..1.0,
        extra in 0.0f64..1.0,
    ) {
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let narrow = AnomalyDetector::new(mean - s1).detect(&samples);
        let wide = AnomalyDetector::new(mean - (s1 + extra)).detect(&samples);
        prop_assert!(wide.corrupted.len() <= narrow.corrupted.len());
        prop_assert_eq!(wide.clean.len() + wide.corrupted.len(), samples.len() + 1);
    }

    /// Same holds for the policy multiplier.
    #[test]
    fn larger_k_flags_fewer(
        samples in prop::collection::vec(0.0f64..1.0, 1..64),
        k in 0.0f64..3.0,
        extra in 0.0f64..3.0,
    ) {
        let profile = SimilarityProfile::from_samples(samples).unwrap();
        let low = AnomalyDetector::from_profile(&profile, &ThresholdPolicy::MeanMinusStdDev { k });
        let high = AnomalyDetector::from_profile(
            &profile,
            &ThresholdPolicy::MeanMinusStdDev { k: k + extra },
        );
        prop_assert!(
            high.detect(&profile.samples).corrupted.len()
                <= low.detect(&profile.samples).corrupted.len()
        );
    }
}
