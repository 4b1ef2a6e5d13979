use super::error::{RestoreError, Result};
use image::{imageops::FilterType, RgbImage};
use serde::{Deserialize, Serialize};

/// 帧数据结构（交错存储，创建后不可变）
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
    /// 到达顺序编号，不代表真实时序
    pub frame_number: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>, frame_number: u64) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if channels == 0 || data.len() != expected {
            return Err(RestoreError::InvalidFrame(format!(
                "frame {}: {}x{}x{} expects {} bytes, got {}",
                frame_number,
                width,
                height,
                channels,
                expected,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
            frame_number,
        })
    }

    pub fn from_rgb(img: RgbImage, frame_number: u64) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 3,
            data: img.into_raw(),
            frame_number,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn shape(&self) -> FrameShape {
        FrameShape {
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    pub fn ensure_same_shape(&self, other: &Frame) -> Result<()> {
        let (a, b) = (self.shape(), other.shape());
        if a != b {
            return Err(RestoreError::ShapeMismatch {
                left: a.to_string(),
                right: b.to_string(),
            });
        }
        Ok(())
    }

    /// Expand to an RGB image; grayscale frames are replicated across channels.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        let rgb: Vec<u8> = match self.channels {
            1 => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            3 => self.data.clone(),
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            c => {
                return Err(RestoreError::InvalidFrame(format!(
                    "unsupported channel count {}",
                    c
                )))
            }
        };

        RgbImage::from_raw(self.width, self.height, rgb).ok_or_else(|| {
            RestoreError::InvalidFrame(format!("frame {} buffer too small", self.frame_number))
        })
    }

    pub fn resize_to(&self, target_width: u32, target_height: u32) -> Result<Frame> {
        if target_width == 0 || target_height == 0 {
            return Err(RestoreError::InvalidFrame(format!(
                "cannot resize to {}x{}",
                target_width, target_height
            )));
        }

        let img = self.to_rgb_image()?;
        let resized = image::imageops::resize(&img, target_width, target_height, FilterType::Triangle);
        Ok(Frame::from_rgb(resized, self.frame_number))
    }
}

/// 帧尺寸（宽、高、通道数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameShape {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl std::fmt::Display for FrameShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// 视频属性：只透传给写出端，不参与核心计算
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoProperties {
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoProperties {
    pub const DEFAULT_FPS: f64 = 25.0;

    pub fn from_frame(frame: &Frame, fps: f64) -> Self {
        Self {
            fps,
            width: frame.width,
            height: frame.height,
        }
    }
}
