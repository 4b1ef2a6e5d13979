//! 视频修复管理器：相似度分析 → 损坏检测 → 距离矩阵 → 链式重排

use super::chain::ChainReconstructor;
use super::config::RestorationConfig;
use super::detector::AnomalyDetector;
use super::distance::PairwiseDistanceBuilder;
use super::error::Result;
use super::frame::Frame;
use super::metric::SimilarityMetric;
use super::profiler::{SequentialProfiler, SimilarityProfile};
use super::ssim::Ssim;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// 单次修复结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestorationReport {
    pub profile: SimilarityProfile,
    pub threshold: f64,
    /// 干净帧的原始索引（保持到达顺序）
    pub clean: Vec<usize>,
    /// 损坏帧的原始索引
    pub corrupted: Vec<usize>,
    /// 重排结果，索引位于干净帧空间 0..clean.len()
    pub ordering: Vec<usize>,
    pub path_cost: f64,
    /// 干净帧不足两帧，重排退化为空操作
    pub degraded: bool,
}

impl RestorationReport {
    /// Maps `ordering` back to arrival indices.
    pub fn ordered_source_indices(&self) -> Vec<usize> {
        self.ordering.iter().map(|&i| self.clean[i]).collect()
    }
}

/// 修复统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestorationStats {
    pub runs: u64,
    pub processed_frames: u64,
    pub corrupted_frames: u64,
    /// 最近一次运行中已完成的矩阵行数
    pub matrix_rows_completed: usize,
}

pub struct RestorationManager {
    config: RestorationConfig,
    metric: Box<dyn SimilarityMetric>,
    runs: AtomicU64,
    processed_count: AtomicU64,
    corrupted_count: AtomicU64,
    rows_completed: Arc<AtomicUsize>,
}

impl RestorationManager {
    /// Manager with the SSIM metric described by `config.ssim`.
    pub fn new(config: RestorationConfig) -> Result<Self> {
        let metric = Ssim::new(config.ssim.clone());
        Self::with_metric(config, metric)
    }

    pub fn with_metric<M: SimilarityMetric + 'static>(
        config: RestorationConfig,
        metric: M,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metric: Box::new(metric),
            runs: AtomicU64::new(0),
            processed_count: AtomicU64::new(0),
            corrupted_count: AtomicU64::new(0),
            rows_completed: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn config(&self) -> &RestorationConfig {
        &self.config
    }

    pub fn get_stats(&self) -> RestorationStats {
        RestorationStats {
            runs: self.runs.load(Ordering::Relaxed),
            processed_frames: self.processed_count.load(Ordering::Relaxed),
            corrupted_frames: self.corrupted_count.load(Ordering::Relaxed),
            matrix_rows_completed: self.rows_completed.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.runs.store(0, Ordering::Relaxed);
        self.processed_count.store(0, Ordering::Relaxed);
        self.corrupted_count.store(0, Ordering::Relaxed);
        self.rows_completed.store(0, Ordering::Relaxed);
    }

    /// Runs the whole pipeline over frames in arrival order.
    pub fn restore(&self, frames: &[Frame]) -> Result<RestorationReport> {
        info!("🎬 Restoring {} frames", frames.len());
        if let Some(first) = frames.first() {
            for frame in &frames[1..] {
                first.ensure_same_shape(frame)?;
            }
        }

        let analysis = self.analysis_frames(frames)?;

        let profile = SequentialProfiler::new(self.metric.as_ref()).profile(&analysis)?;
        let detector = AnomalyDetector::from_profile(&profile, &self.config.threshold);
        let classification = detector.detect(&profile.samples);
        let degraded = classification.is_degraded();

        let (ordering, path_cost) = if degraded {
            warn!("⚠️ Clean set too small, skipping distance matrix and reconstruction");
            ((0..classification.clean.len()).collect(), 0.0)
        } else {
            let clean_frames: Vec<&Frame> =
                classification.clean.iter().map(|&i| &analysis[i]).collect();

            self.rows_completed.store(0, Ordering::Relaxed);
            let matrix = PairwiseDistanceBuilder::new(self.metric.as_ref())
                .with_threads(self.config.num_threads)
                .with_progress(self.rows_completed.clone())
                .build(&clean_frames)?;

            let ordering = ChainReconstructor::new().reconstruct(&matrix);
            let cost = matrix.path_cost(&ordering);
            (ordering, cost)
        };

        self.runs.fetch_add(1, Ordering::Relaxed);
        self.processed_count
            .fetch_add(frames.len() as u64, Ordering::Relaxed);
        self.corrupted_count
            .fetch_add(classification.corrupted.len() as u64, Ordering::Relaxed);

        Ok(RestorationReport {
            profile,
            threshold: detector.threshold(),
            clean: classification.clean,
            corrupted: classification.corrupted,
            ordering,
            path_cost,
            degraded,
        })
    }

    /// Frames the metric sees: downscaled copies when `sample_size` is set.
    fn analysis_frames<'f>(&self, frames: &'f [Frame]) -> Result<Cow<'f, [Frame]>> {
        match self.config.sample_size {
            Some((w, h)) => {
                info!("📐 Downscaling frames to {}x{} for analysis", w, h);
                let resized = frames
                    .par_iter()
                    .map(|f| f.resize_to(w, h))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Cow::Owned(resized))
            }
            None => Ok(Cow::Borrowed(frames)),
        }
    }
}

impl Default for RestorationManager {
    fn default() -> Self {
        Self {
            config: RestorationConfig::default(),
            metric: Box::new(Ssim::default()),
            runs: AtomicU64::new(0),
            processed_count: AtomicU64::new(0),
            corrupted_count: AtomicU64::new(0),
            rows_completed: Arc::new(AtomicUsize::new(0)),
        }
    }
}
