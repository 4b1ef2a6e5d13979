use super::error::{RestoreError, Result};
use super::profiler::SimilarityProfile;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// 损坏阈值策略
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// threshold = mean - k * stddev
    MeanMinusStdDev { k: f64 },
    /// 固定阈值，忽略统计量
    Fixed { value: f64 },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::MeanMinusStdDev { k: 1.0 }
    }
}

impl ThresholdPolicy {
    pub fn threshold(&self, profile: &SimilarityProfile) -> f64 {
        match *self {
            ThresholdPolicy::MeanMinusStdDev { k } => profile.mean - k * profile.stddev,
            ThresholdPolicy::Fixed { value } => value,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            ThresholdPolicy::MeanMinusStdDev { k } if !(k.is_finite() && k >= 0.0) => {
                Err(RestoreError::InvalidConfig(format!(
                    "stddev multiplier must be finite and >= 0, got {}",
                    k
                )))
            }
            ThresholdPolicy::Fixed { value } if !value.is_finite() => Err(
                RestoreError::InvalidConfig(format!("fixed threshold must be finite, got {}", value)),
            ),
            _ => Ok(()),
        }
    }
}

/// 帧分类结果，索引均为到达顺序
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub clean: Vec<usize>,
    pub corrupted: Vec<usize>,
}

impl Classification {
    /// Fewer than two clean frames leaves nothing to reorder.
    pub fn is_degraded(&self) -> bool {
        self.clean.len() < 2
    }
}

/// 损坏帧检测器
///
/// Frame `i` is corrupted when the similarity to its predecessor,
/// `samples[i - 1]`, is strictly below the threshold. Frame 0 has no
/// predecessor and is always clean. A corrupted frame that follows another
/// corrupted frame slips through if the two happen to score above the
/// threshold with each other.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl AnomalyDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_profile(profile: &SimilarityProfile, policy: &ThresholdPolicy) -> Self {
        let threshold = policy.threshold(profile);
        info!("🎯 Corruption threshold: {:.4}", threshold);
        Self::new(threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn detect(&self, samples: &[f64]) -> Classification {
        let mut result = Classification {
            clean: vec![0],
            corrupted: Vec::new(),
        };

        for (i, &sample) in samples.iter().enumerate() {
            let frame = i + 1;
            if sample < self.threshold {
                debug!(
                    "frame {} flagged: {:.4} < {:.4}",
                    frame, sample, self.threshold
                );
                result.corrupted.push(frame);
            } else {
                result.clean.push(frame);
            }
        }

        info!(
            "🔍 {} corrupted, {} clean",
            result.corrupted.len(),
            result.clean.len()
        );
        if result.is_degraded() {
            warn!(
                "⚠️ Only {} clean frame(s) left, reconstruction degrades to a no-op",
                result.clean.len()
            );
        }
        result
    }
}
