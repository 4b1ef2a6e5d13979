use super::error::Result;
use super::frame::Frame;
use std::collections::HashMap;

/// 帧相似度度量：对称、确定，相同输入取最大值
pub trait SimilarityMetric: Send + Sync {
    fn similarity(&self, a: &Frame, b: &Frame) -> Result<f64>;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<M: SimilarityMetric + ?Sized> SimilarityMetric for &M {
    fn similarity(&self, a: &Frame, b: &Frame) -> Result<f64> {
        (**self).similarity(a, b)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<M: SimilarityMetric + ?Sized> SimilarityMetric for Box<M> {
    fn similarity(&self, a: &Frame, b: &Frame) -> Result<f64> {
        (**self).similarity(a, b)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// 按帧编号给出相似度的模拟度量（测试和演示用）
pub struct MockMetric {
    pattern: Box<dyn Fn(u64, u64) -> f64 + Send + Sync>,
}

impl MockMetric {
    pub fn with_pattern<F>(pattern: F) -> Self
    where
        F: Fn(u64, u64) -> f64 + Send + Sync + 'static,
    {
        Self {
            pattern: Box::new(pattern),
        }
    }

    /// Every pair of distinct frames scores `value`; identical numbers score 1.0.
    pub fn constant(value: f64) -> Self {
        Self::with_pattern(move |a, b| if a == b { 1.0 } else { value })
    }

    /// Looks up unordered pairs in `table`, falling back to `default`.
    pub fn with_table(table: HashMap<(u64, u64), f64>, default: f64) -> Self {
        Self::with_pattern(move |a, b| {
            if a == b {
                return 1.0;
            }
            let key = (a.min(b), a.max(b));
            table.get(&key).copied().unwrap_or(default)
        })
    }
}

impl SimilarityMetric for MockMetric {
    fn similarity(&self, a: &Frame, b: &Frame) -> Result<f64> {
        a.ensure_same_shape(b)?;
        Ok((self.pattern)(a.frame_number, b.frame_number))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// 基于平均绝对像素差的轻量度量，取值 [0, 1]
pub struct MeanAbsMetric;

impl SimilarityMetric for MeanAbsMetric {
    fn similarity(&self, a: &Frame, b: &Frame) -> Result<f64> {
        a.ensure_same_shape(b)?;
        if a.data.is_empty() {
            return Ok(1.0);
        }

        let diff: u64 = a
            .data
            .iter()
            .zip(b.data.iter())
            .map(|(&x, &y)| (x as i16 - y as i16).unsigned_abs() as u64)
            .sum();
        Ok(1.0 - diff as f64 / (a.data.len() as f64 * 255.0))
    }

    fn name(&self) -> &str {
        "mean-abs"
    }
}
