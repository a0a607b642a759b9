use super::{AnomalyFlag, DetectionMethod, FlagTarget};
use crate::core::bucket::TimeBucket;
use crate::parser::line::LogRecord;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use thiserror::Error;

pub const DEFAULT_TREES: usize = 100;
pub const DEFAULT_SAMPLE_SIZE: usize = 256;
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Features per bucket: event count, distinct usernames, distinct IPs.
const FEATURE_DIMS: usize = 3;

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot fit isolation forest on {observations} observation(s), need at least 2")]
pub struct ModelFitError {
    pub observations: usize,
}

/// Unsupervised outlier model over per-bucket feature vectors.
///
/// Each tree recursively partitions the feature space with a random split
/// dimension and threshold; points isolated after few splits score high.
/// Randomness is driven entirely by the per-run seed, never by process-global
/// state, so a seeded run is fully reproducible.
#[derive(Debug, Clone, Copy)]
pub struct IsolationForestDetector {
    pub trees: usize,
    pub sample_size: usize,
    /// Expected fraction of anomalous observations; sets the score quantile
    /// above which a bucket is flagged.
    pub contamination: f64,
    /// `Some` for deterministic runs, `None` for entropy-seeded ones.
    pub seed: Option<u64>,
}

impl Default for IsolationForestDetector {
    fn default() -> Self {
        IsolationForestDetector {
            trees: DEFAULT_TREES,
            sample_size: DEFAULT_SAMPLE_SIZE,
            contamination: DEFAULT_CONTAMINATION,
            seed: None,
        }
    }
}

enum Node {
    Split {
        dimension: usize,
        threshold: f64,
        below: Box<Node>,
        above: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

impl IsolationForestDetector {
    /// Fit a forest over the bucket features and flag the outliers.
    ///
    /// Fails with `ModelFitError` on fewer than two observations; the caller
    /// is expected to keep the rest of the pipeline running.
    pub fn detect(
        &self,
        buckets: &[TimeBucket],
        records: &[LogRecord],
    ) -> Result<Vec<AnomalyFlag>, ModelFitError> {
        let features: Vec<[f64; FEATURE_DIMS]> = buckets
            .iter()
            .map(|bucket| bucket_features(bucket, records))
            .collect();
        let scores = self.fit_scores(&features)?;
        let cutoff = quantile(&scores, 1.0 - self.contamination);

        Ok(buckets
            .iter()
            .zip(&scores)
            .map(|(bucket, &score)| AnomalyFlag {
                target: FlagTarget::Bucket {
                    start_epoch: bucket.start_epoch,
                },
                method: DetectionMethod::IsolationForest,
                score,
                is_anomalous: score > cutoff,
            })
            .collect())
    }

    /// Average path length across the forest, normalized into an anomaly
    /// score in (0, 1): shorter isolation paths score higher.
    fn fit_scores(&self, features: &[[f64; FEATURE_DIMS]]) -> Result<Vec<f64>, ModelFitError> {
        let n = features.len();
        if n < 2 {
            return Err(ModelFitError { observations: n });
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let sample_size = self.sample_size.min(n).max(2);
        let depth_limit = (sample_size as f64).log2().ceil() as usize;
        let mut indices: Vec<usize> = (0..n).collect();
        let mut path_sums = vec![0.0; n];

        for _ in 0..self.trees {
            let (sampled, _) = indices.partial_shuffle(&mut rng, sample_size);
            let sample: Vec<usize> = sampled.to_vec();
            let tree = grow_tree(&mut rng, features, &sample, 0, depth_limit);
            for (sum, feature) in path_sums.iter_mut().zip(features) {
                *sum += path_length(&tree, feature, 0);
            }
        }

        let normalizer = average_path_length(sample_size);
        Ok(path_sums
            .iter()
            .map(|sum| {
                let average = sum / self.trees as f64;
                2f64.powf(-average / normalizer)
            })
            .collect())
    }
}

fn bucket_features(bucket: &TimeBucket, records: &[LogRecord]) -> [f64; FEATURE_DIMS] {
    let mut usernames: HashSet<&str> = HashSet::new();
    let mut ips: HashSet<&str> = HashSet::new();
    for &index in &bucket.records {
        if let Some(record) = records.get(index) {
            if let Some(username) = record.username.as_deref() {
                usernames.insert(username);
            }
            if let Some(ip) = record.ip_address.as_deref() {
                ips.insert(ip);
            }
        }
    }
    [
        bucket.count as f64,
        usernames.len() as f64,
        ips.len() as f64,
    ]
}

fn grow_tree(
    rng: &mut StdRng,
    features: &[[f64; FEATURE_DIMS]],
    sample: &[usize],
    depth: usize,
    depth_limit: usize,
) -> Node {
    if sample.len() <= 1 || depth >= depth_limit {
        return Node::Leaf {
            size: sample.len(),
        };
    }

    // Only dimensions where the sample still varies can be split.
    let splittable: Vec<usize> = (0..FEATURE_DIMS)
        .filter(|&dimension| {
            let (min, max) = min_max(features, sample, dimension);
            max > min
        })
        .collect();
    let Some(&dimension) = splittable.as_slice().choose(rng) else {
        return Node::Leaf {
            size: sample.len(),
        };
    };

    let (min, max) = min_max(features, sample, dimension);
    let threshold = rng.gen_range(min..max);
    // `<=` keeps both sides non-empty: the minimum lands below, the maximum
    // stays strictly above any threshold drawn from [min, max).
    let (below, above): (Vec<usize>, Vec<usize>) = sample
        .iter()
        .copied()
        .partition(|&index| features[index][dimension] <= threshold);

    Node::Split {
        dimension,
        threshold,
        below: Box::new(grow_tree(rng, features, &below, depth + 1, depth_limit)),
        above: Box::new(grow_tree(rng, features, &above, depth + 1, depth_limit)),
    }
}

fn min_max(features: &[[f64; FEATURE_DIMS]], sample: &[usize], dimension: usize) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &index in sample {
        let value = features[index][dimension];
        min = min.min(value);
        max = max.max(value);
    }
    (min, max)
}

fn path_length(node: &Node, feature: &[f64; FEATURE_DIMS], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            dimension,
            threshold,
            below,
            above,
        } => {
            if feature[*dimension] <= *threshold {
                path_length(below, feature, depth + 1)
            } else {
                path_length(above, feature, depth + 1)
            }
        }
    }
}

/// `c(n)`: average unsuccessful-search path length in a binary search tree of
/// `n` nodes, the standard adjustment for unresolved leaf groups.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
}

/// Nearest-rank quantile over an unsorted slice.
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(start_epoch: i64, count: usize) -> TimeBucket {
        TimeBucket {
            start_epoch,
            width_seconds: 10,
            count,
            records: Vec::new(),
        }
    }

    fn seeded(seed: u64) -> IsolationForestDetector {
        IsolationForestDetector {
            seed: Some(seed),
            ..IsolationForestDetector::default()
        }
    }

    #[test]
    fn test_single_observation_is_a_fit_error() {
        let buckets = vec![bucket(0, 1)];
        let err = seeded(42)
            .detect(&buckets, &[])
            .expect_err("one observation cannot be fit");
        assert_eq!(err.observations, 1);
    }

    #[test]
    fn test_no_observations_is_a_fit_error() {
        let err = seeded(42).detect(&[], &[]).expect_err("nothing to fit");
        assert_eq!(err.observations, 0);
    }

    #[test]
    fn test_extreme_outlier_has_top_score_and_is_flagged() {
        // 59 identical buckets and one with a count two orders of magnitude
        // higher. Every tree separates the outlier at its first split, so its
        // score is strictly the maximum and the 0.95 quantile cutoff flags it
        // alone.
        let mut buckets: Vec<TimeBucket> = (0..59).map(|i| bucket(i * 10, 1)).collect();
        buckets.push(bucket(590, 100));

        let flags = seeded(7).detect(&buckets, &[]).expect("fits");
        let outlier = &flags[59];
        assert!(outlier.is_anomalous);
        for flag in &flags[..59] {
            assert!(!flag.is_anomalous);
            assert!(flag.score < outlier.score);
        }
    }

    #[test]
    fn test_uniform_data_yields_no_flags() {
        let buckets: Vec<TimeBucket> = (0..30).map(|i| bucket(i * 10, 4)).collect();
        let flags = seeded(3).detect(&buckets, &[]).expect("fits");
        assert!(flags.iter().all(|flag| !flag.is_anomalous));
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let buckets: Vec<TimeBucket> = (0..40).map(|i| bucket(i as i64 * 10, (i % 7) + 1)).collect();
        let first = seeded(99).detect(&buckets, &[]).expect("fits");
        let second = seeded(99).detect(&buckets, &[]).expect("fits");
        assert_eq!(first, second);
    }

    #[test]
    fn test_scores_are_in_unit_interval() {
        let buckets: Vec<TimeBucket> = (0..25).map(|i| bucket(i as i64 * 10, (i % 5) + 1)).collect();
        let flags = seeded(1).detect(&buckets, &[]).expect("fits");
        for flag in &flags {
            assert!(flag.score > 0.0 && flag.score < 1.0, "score {}", flag.score);
        }
    }

    #[test]
    fn test_average_path_length_grows_with_n() {
        assert_eq!(average_path_length(1), 0.0);
        assert!(average_path_length(2) > 0.0);
        assert!(average_path_length(100) > average_path_length(10));
    }
}
