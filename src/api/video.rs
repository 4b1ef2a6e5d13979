//! 视频帧修复器

use crate::core::video::store::{self, SequenceManifest};
use crate::core::video::{
    Frame, RestorationConfig, RestorationManager, RestorationReport, RestorationStats, Result,
    SimilarityMetric,
};
use log::info;
use std::path::{Path, PathBuf};

pub const CORRUPTED_DIR: &str = "corrupted_frames";
pub const RECONSTRUCTED_DIR: &str = "reconstructed";

/// 目录级修复任务的结果
#[derive(Debug, Clone)]
pub struct DirectoryRestoration {
    pub report: RestorationReport,
    pub manifest: SequenceManifest,
    pub corrupted_dir: PathBuf,
    pub reconstructed_dir: PathBuf,
}

/// 视频帧修复器 - 损坏检测 + 顺序重建
///
/// ```no_run
/// use frame_restore::api::video::VideoRestorer;
/// use frame_restore::core::video::RestorationConfig;
///
/// let restorer = VideoRestorer::create(RestorationConfig::default())?;
/// let result = restorer.restore_directory("frames/", "output/")?;
/// println!("{} corrupted", result.report.corrupted.len());
/// # Ok::<(), frame_restore::core::video::RestoreError>(())
/// ```
pub struct VideoRestorer {
    manager: RestorationManager,
}

impl VideoRestorer {
    /// 使用 SSIM 度量创建修复器
    pub fn create(config: RestorationConfig) -> Result<Self> {
        info!("🎬 VideoRestorer: created");
        Ok(Self {
            manager: RestorationManager::new(config)?,
        })
    }

    pub fn with_metric<M: SimilarityMetric + 'static>(
        config: RestorationConfig,
        metric: M,
    ) -> Result<Self> {
        info!("🎬 VideoRestorer: created with {} metric", metric.name());
        Ok(Self {
            manager: RestorationManager::with_metric(config, metric)?,
        })
    }

    /// 修复内存中的帧序列
    pub fn restore_frames(&self, frames: &[Frame]) -> Result<RestorationReport> {
        self.manager.restore(frames)
    }

    /// Reads frames from `input`, restores them and writes
    /// `output/corrupted_frames` and `output/reconstructed`. Output
    /// directories are only touched after the pipeline succeeds.
    pub fn restore_directory(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<DirectoryRestoration> {
        let (frames, properties) = store::load_frames(input)?;
        let report = self.manager.restore(&frames)?;

        let output = output.as_ref();
        let corrupted_dir = output.join(CORRUPTED_DIR);
        let reconstructed_dir = output.join(RECONSTRUCTED_DIR);
        store::reset_directories(&[&corrupted_dir, &reconstructed_dir])?;

        store::relocate_corrupted(&frames, &report.corrupted, &corrupted_dir)?;
        let manifest = store::write_sequence(
            &frames,
            &report.ordered_source_indices(),
            &report.corrupted,
            properties,
            &reconstructed_dir,
        )?;

        Ok(DirectoryRestoration {
            report,
            manifest,
            corrupted_dir,
            reconstructed_dir,
        })
    }

    /// 获取修复统计
    pub fn stats(&self) -> RestorationStats {
        self.manager.get_stats()
    }

    /// 重置统计
    pub fn reset(&self) {
        self.manager.reset()
    }
}

impl Drop for VideoRestorer {
    fn drop(&mut self) {
        info!("🗑️ VideoRestorer: released");
    }
}
