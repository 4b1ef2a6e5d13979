use super::error::{RestoreError, Result};
use super::frame::Frame;
use super::metric::SimilarityMetric;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// 相邻帧相似度统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityProfile {
    /// samples[i] = similarity(frame i, frame i + 1)
    pub samples: Vec<f64>,
    pub mean: f64,
    /// 总体标准差
    pub stddev: f64,
}

impl SimilarityProfile {
    /// Population statistics from running sum and sum of squares.
    pub fn from_samples(samples: Vec<f64>) -> Result<Self> {
        if samples.is_empty() {
            // 零个样本对应一帧
            return Err(RestoreError::InsufficientData {
                frames: samples.len() + 1,
            });
        }

        let (sum, sum_sq) = samples
            .iter()
            .fold((0.0f64, 0.0f64), |(sum, sum_sq), &s| (sum + s, sum_sq + s * s));
        let n = samples.len() as f64;
        let mean = sum / n;
        // 浮点误差可能导致方差略小于 0
        let variance = (sum_sq / n - mean * mean).max(0.0);

        Ok(Self {
            samples,
            mean,
            stddev: variance.sqrt(),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() + 1
    }
}

/// 顺序相似度分析器：逐对比较到达顺序中的相邻帧
pub struct SequentialProfiler<'a, M: SimilarityMetric + ?Sized> {
    metric: &'a M,
}

impl<'a, M: SimilarityMetric + ?Sized> SequentialProfiler<'a, M> {
    pub fn new(metric: &'a M) -> Self {
        Self { metric }
    }

    pub fn profile(&self, frames: &[Frame]) -> Result<SimilarityProfile> {
        if frames.len() < 2 {
            return Err(RestoreError::InsufficientData {
                frames: frames.len(),
            });
        }

        let samples = frames
            .windows(2)
            .map(|pair| {
                let score = self.metric.similarity(&pair[0], &pair[1])?;
                debug!(
                    "similarity({}, {}) = {:.4}",
                    pair[0].frame_number, pair[1].frame_number, score
                );
                Ok(score)
            })
            .collect::<Result<Vec<f64>>>()?;

        let profile = SimilarityProfile::from_samples(samples)?;
        info!(
            "📊 Profiled {} frames with {}: mean {:.4}, stddev {:.4}",
            frames.len(),
            self.metric.name(),
            profile.mean,
            profile.stddev
        );
        Ok(profile)
    }
}
