//! Structural Similarity Index (SSIM) between two frames.
//!
//! Local statistics come from a separable Gaussian blur over the whole plane
//! (reflect-101 borders), so the SSIM map has the same size as the input.
//! The score is the map mean, averaged over channels; 1.0 means identical.

use super::error::{RestoreError, Result};
use super::frame::Frame;
use super::metric::SimilarityMetric;
use serde::{Deserialize, Serialize};

/// SSIM 参数（默认值对应 8 bit 图像）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsimConfig {
    /// 高斯窗口边长，必须为奇数
    pub window_size: usize,
    pub sigma: f64,
    /// (K1 * 255)^2
    pub c1: f64,
    /// (K2 * 255)^2
    pub c2: f64,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            window_size: 11,
            sigma: 1.5,
            c1: 6.5025,
            c2: 58.5225,
        }
    }
}

impl SsimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 || self.window_size % 2 == 0 {
            return Err(RestoreError::InvalidConfig(format!(
                "SSIM window size must be odd and positive, got {}",
                self.window_size
            )));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(RestoreError::InvalidConfig(format!(
                "SSIM sigma must be positive, got {}",
                self.sigma
            )));
        }
        if !(self.c1.is_finite() && self.c2.is_finite()) || self.c1 <= 0.0 || self.c2 <= 0.0 {
            return Err(RestoreError::InvalidConfig(
                "SSIM stability constants must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Ssim {
    config: SsimConfig,
    /// 一维归一化高斯核
    kernel: Vec<f64>,
}

impl Default for Ssim {
    fn default() -> Self {
        Self::new(SsimConfig::default())
    }
}

impl Ssim {
    pub fn new(config: SsimConfig) -> Self {
        let kernel = gaussian_kernel(config.window_size.max(1), config.sigma);
        Self { config, kernel }
    }

    pub fn config(&self) -> &SsimConfig {
        &self.config
    }

    /// SSIM of one interleaved channel.
    fn channel_ssim(&self, a: &Frame, b: &Frame, channel: usize) -> f64 {
        let w = a.width as usize;
        let h = a.height as usize;
        let n = w * h;
        if n == 0 {
            return 1.0;
        }

        let i1 = extract_plane(a, channel);
        let i2 = extract_plane(b, channel);

        let i1_sq: Vec<f64> = i1.iter().map(|v| v * v).collect();
        let i2_sq: Vec<f64> = i2.iter().map(|v| v * v).collect();
        let i1_i2: Vec<f64> = i1.iter().zip(&i2).map(|(x, y)| x * y).collect();

        let mu1 = self.blur(&i1, w, h);
        let mu2 = self.blur(&i2, w, h);
        let s1 = self.blur(&i1_sq, w, h);
        let s2 = self.blur(&i2_sq, w, h);
        let s12 = self.blur(&i1_i2, w, h);

        let (c1, c2) = (self.config.c1, self.config.c2);
        let mut sum = 0.0;
        for idx in 0..n {
            let mu1_mu2 = mu1[idx] * mu2[idx];
            let mu1_sq = mu1[idx] * mu1[idx];
            let mu2_sq = mu2[idx] * mu2[idx];
            let sigma1_sq = s1[idx] - mu1_sq;
            let sigma2_sq = s2[idx] - mu2_sq;
            let sigma12 = s12[idx] - mu1_mu2;

            let num = (2.0 * mu1_mu2 + c1) * (2.0 * sigma12 + c2);
            let den = (mu1_sq + mu2_sq + c1) * (sigma1_sq + sigma2_sq + c2);
            sum += num / den;
        }

        sum / n as f64
    }

    /// Separable Gaussian blur, same-size output.
    fn blur(&self, src: &[f64], w: usize, h: usize) -> Vec<f64> {
        let radius = (self.kernel.len() / 2) as isize;

        let mut tmp = vec![0.0; src.len()];
        for y in 0..h {
            let row = &src[y * w..(y + 1) * w];
            for x in 0..w {
                let mut acc = 0.0;
                for (k, weight) in self.kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - radius, w);
                    acc += weight * row[sx];
                }
                tmp[y * w + x] = acc;
            }
        }

        let mut out = vec![0.0; src.len()];
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, weight) in self.kernel.iter().enumerate() {
                    let sy = reflect_101(y as isize + k as isize - radius, h);
                    acc += weight * tmp[sy * w + x];
                }
                out[y * w + x] = acc;
            }
        }
        out
    }
}

impl SimilarityMetric for Ssim {
    fn similarity(&self, a: &Frame, b: &Frame) -> Result<f64> {
        a.ensure_same_shape(b)?;

        let channels = a.channels as usize;
        let total: f64 = (0..channels).map(|c| self.channel_ssim(a, b, c)).sum();
        Ok(total / channels as f64)
    }

    fn name(&self) -> &str {
        "ssim"
    }
}

fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let center = (size as f64 - 1.0) / 2.0;
    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Border mode `dcb|abcd|cba`; loops for kernels wider than the image.
fn reflect_101(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

fn extract_plane(frame: &Frame, channel: usize) -> Vec<f64> {
    let channels = frame.channels as usize;
    frame
        .data
        .iter()
        .skip(channel)
        .step_by(channels)
        .map(|&v| v as f64)
        .collect()
}
