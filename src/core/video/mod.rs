//! 视频帧修复 - 从乱序且部分损坏的帧序列中恢复连贯顺序
//!
//! 核心流程：
//! 1. 顺序分析 - 相邻帧相似度的均值与标准差
//! 2. 损坏检测 - 相似度低于 mean - stddev 的帧视为损坏
//! 3. 距离矩阵 - 干净帧两两计算 1 - similarity（并行）
//! 4. 链式重排 - 最近邻贪心地从两端延长路径

pub mod chain;
pub mod config;
pub mod detector;
pub mod distance;
pub mod error;
pub mod frame;
pub mod manager;
pub mod metric;
pub mod profiler;
pub mod ssim;
pub mod store;

pub use chain::ChainReconstructor;
pub use config::RestorationConfig;
pub use detector::{AnomalyDetector, Classification, ThresholdPolicy};
pub use distance::{DistanceMatrix, PairwiseDistanceBuilder};
pub use error::{RestoreError, Result};
pub use frame::{Frame, FrameShape, VideoProperties};
pub use manager::{RestorationManager, RestorationReport, RestorationStats};
pub use metric::{MeanAbsMetric, MockMetric, SimilarityMetric};
pub use profiler::{SequentialProfiler, SimilarityProfile};
pub use ssim::{Ssim, SsimConfig};
pub use store::SequenceManifest;
