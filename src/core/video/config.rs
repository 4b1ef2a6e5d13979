use super::detector::ThresholdPolicy;
use super::error::{RestoreError, Result};
use super::ssim::SsimConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestorationConfig {
    pub threshold: ThresholdPolicy,
    /// 度量前缩放到 (宽, 高)；None 表示原始分辨率
    pub sample_size: Option<(u32, u32)>,
    /// 距离矩阵阶段的线程数；None 表示全部 CPU
    pub num_threads: Option<usize>,
    pub ssim: SsimConfig,
}

impl Default for RestorationConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdPolicy::default(),
            sample_size: None,
            num_threads: None,
            ssim: SsimConfig::default(),
        }
    }
}

impl RestorationConfig {
    /// Tighter threshold, flags more frames.
    pub fn strict() -> Self {
        Self {
            threshold: ThresholdPolicy::MeanMinusStdDev { k: 0.5 },
            ..Self::default()
        }
    }

    pub fn lenient() -> Self {
        Self {
            threshold: ThresholdPolicy::MeanMinusStdDev { k: 2.0 },
            ..Self::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.threshold.validate()?;
        if let Some((w, h)) = self.sample_size {
            if w == 0 || h == 0 {
                return Err(RestoreError::InvalidConfig(format!(
                    "sample size must be non-zero, got {}x{}",
                    w, h
                )));
            }
        }
        if self.num_threads == Some(0) {
            return Err(RestoreError::InvalidConfig(
                "num_threads must be at least 1".to_string(),
            ));
        }
        self.ssim.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_mean_minus_one_stddev() {
        let config = RestorationConfig::default();
        assert_eq!(config.threshold, ThresholdPolicy::MeanMinusStdDev { k: 1.0 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert!(RestorationConfig::strict().validate().is_ok());
        assert!(RestorationConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero_sample = RestorationConfig {
            sample_size: Some((0, 10)),
            ..RestorationConfig::default()
        };
        assert!(zero_sample.validate().is_err());

        let zero_threads = RestorationConfig {
            num_threads: Some(0),
            ..RestorationConfig::default()
        };
        assert!(zero_threads.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"threshold": {{"kind": "fixed", "value": 0.4}}, "num_threads": 2}}"#
        )
        .unwrap();

        let config = RestorationConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.threshold, ThresholdPolicy::Fixed { value: 0.4 });
        assert_eq!(config.num_threads, Some(2));
        assert_eq!(config.ssim, SsimConfig::default());
        assert_eq!(config.sample_size, None);
    }
}
