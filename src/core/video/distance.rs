use super::error::{RestoreError, Result};
use super::frame::Frame;
use super::metric::SimilarityMetric;
use log::{debug, info};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use std::borrow::Borrow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 对称距离矩阵，对角线为 0
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Array2<f64>,
}

impl DistanceMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            data: Array2::zeros((size, size)),
        }
    }

    /// Builds a matrix from explicit rows, rejecting non-square or
    /// non-finite input. Only the upper triangle is read; it is mirrored.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let size = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(RestoreError::InvalidConfig(format!(
                "distance row {} has {} entries, expected {}",
                i,
                row.len(),
                size
            )));
        }
        let full = Array2::from_shape_vec((size, size), rows.concat())
            .map_err(|e| RestoreError::InvalidConfig(format!("distance rows: {}", e)))?;

        let mut matrix = Self::zeros(size);
        for ((i, j), &dist) in full.indexed_iter() {
            if j > i {
                matrix.set_pair(i, j, dist)?;
            }
        }
        Ok(matrix)
    }

    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[[i, j]]
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    fn set_pair(&mut self, i: usize, j: usize, dist: f64) -> Result<()> {
        if !dist.is_finite() {
            return Err(RestoreError::NonFiniteDistance { row: i, col: j });
        }
        self.data[[i, j]] = dist;
        self.data[[j, i]] = dist;
        Ok(())
    }

    pub fn is_symmetric(&self) -> bool {
        self.data == self.data.t()
    }

    /// Sum of distances between consecutive entries of `order`.
    pub fn path_cost(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }
}

/// 两两距离构建器：distance = 1 - similarity，按行并行
pub struct PairwiseDistanceBuilder<'a, M: SimilarityMetric + ?Sized> {
    metric: &'a M,
    num_threads: Option<usize>,
    progress: Arc<AtomicUsize>,
}

impl<'a, M: SimilarityMetric + ?Sized> PairwiseDistanceBuilder<'a, M> {
    pub fn new(metric: &'a M) -> Self {
        Self {
            metric,
            num_threads: None,
            progress: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Shares a rows-completed counter with the caller.
    pub fn with_progress(mut self, progress: Arc<AtomicUsize>) -> Self {
        self.progress = progress;
        self
    }

    pub fn rows_completed(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    pub fn build<F>(&self, frames: &[F]) -> Result<DistanceMatrix>
    where
        F: Borrow<Frame> + Sync,
    {
        let m = frames.len();
        let threads = self.num_threads.unwrap_or_else(num_cpus::get).max(1);
        info!(
            "🧮 Building {}x{} distance matrix ({} pairs, {} threads)",
            m,
            m,
            m * m.saturating_sub(1) / 2,
            threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| RestoreError::InvalidConfig(format!("thread pool: {}", e)))?;

        // 每行只计算上三角部分 (i, j > i)，行之间互不依赖
        let upper: Vec<Vec<f64>> = pool.install(|| {
            (0..m)
                .into_par_iter()
                .map(|i| {
                    let a = frames[i].borrow();
                    let row = ((i + 1)..m)
                        .map(|j| Ok(1.0 - self.metric.similarity(a, frames[j].borrow())?))
                        .collect::<Result<Vec<f64>>>()?;

                    let done = self.progress.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!("Progress: {}/{} rows", done, m);
                    Ok(row)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut matrix = DistanceMatrix::zeros(m);
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, dist) in row.into_iter().enumerate() {
                matrix.set_pair(i, i + 1 + offset, dist)?;
            }
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::metric::MockMetric;

    fn create_frames(count: u64) -> Vec<Frame> {
        (0..count)
            .map(|n| Frame::new(2, 2, 1, vec![0u8; 4], n).unwrap())
            .collect()
    }

    #[test]
    fn test_distance_is_one_minus_similarity() {
        let metric = MockMetric::with_pattern(|a, b| 1.0 - (a as f64 - b as f64).abs() / 10.0);
        let matrix = PairwiseDistanceBuilder::new(&metric)
            .build(&create_frames(4))
            .unwrap();

        assert_eq!(matrix.size(), 4);
        assert!((matrix.get(0, 3) - 0.3).abs() < 1e-12);
        assert!((matrix.get(2, 1) - 0.1).abs() < 1e-12);
        assert_eq!(matrix.get(2, 2), 0.0);
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn test_accepts_borrowed_frames() {
        let frames = create_frames(3);
        let refs: Vec<&Frame> = frames.iter().collect();
        let metric = MockMetric::constant(0.25);
        let matrix = PairwiseDistanceBuilder::new(&metric).build(&refs).unwrap();
        assert_eq!(matrix.get(0, 2), 0.75);
    }

    #[test]
    fn test_progress_counts_rows() {
        let metric = MockMetric::constant(0.5);
        let progress = Arc::new(AtomicUsize::new(0));
        let builder = PairwiseDistanceBuilder::new(&metric)
            .with_threads(Some(2))
            .with_progress(progress.clone());
        builder.build(&create_frames(6)).unwrap();

        assert_eq!(progress.load(Ordering::Relaxed), 6);
        assert_eq!(builder.rows_completed(), 6);
    }

    #[test]
    fn test_empty_and_single() {
        let metric = MockMetric::constant(0.5);
        let builder = PairwiseDistanceBuilder::new(&metric);
        assert!(builder.build::<Frame>(&[]).unwrap().is_empty());
        assert_eq!(builder.build(&create_frames(1)).unwrap().size(), 1);
    }

    #[test]
    fn test_non_finite_distance_rejected() {
        let metric = MockMetric::constant(f64::NAN);
        let err = PairwiseDistanceBuilder::new(&metric)
            .build(&create_frames(3))
            .unwrap_err();
        assert!(matches!(err, RestoreError::NonFiniteDistance { row: 0, col: 1 }));
    }

    #[test]
    fn test_from_rows_mirrors_upper_triangle() {
        let matrix = DistanceMatrix::from_rows(&[
            vec![0.0, 0.4, 0.6],
            vec![9.9, 0.0, 0.2],
            vec![9.9, 9.9, 0.0],
        ])
        .unwrap();
        assert_eq!(matrix.get(1, 0), 0.4);
        assert_eq!(matrix.get(2, 1), 0.2);
        assert!((matrix.path_cost(&[0, 1, 2]) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_row_view_and_array() {
        let matrix = DistanceMatrix::from_rows(&[
            vec![0.0, 0.4, 0.6],
            vec![0.4, 0.0, 0.2],
            vec![0.6, 0.2, 0.0],
        ])
        .unwrap();
        assert_eq!(matrix.row(1).to_vec(), vec![0.4, 0.0, 0.2]);
        assert_eq!(matrix.as_array().shape(), &[3, 3]);
        assert_eq!(matrix.as_array()[[2, 0]], 0.6);
    }

    #[test]
    fn test_from_rows_rejects_non_finite() {
        let err = DistanceMatrix::from_rows(&[vec![0.0, f64::INFINITY], vec![0.0, 0.0]])
            .unwrap_err();
        assert!(matches!(err, RestoreError::NonFiniteDistance { row: 0, col: 1 }));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(DistanceMatrix::from_rows(&[vec![0.0, 1.0], vec![1.0]]).is_err());
    }
}
