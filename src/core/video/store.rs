//! 图像序列存储：读入帧、转移损坏帧、按重排顺序写出

use super::error::{RestoreError, Result};
use super::frame::{Frame, VideoProperties};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];
pub const PROPERTIES_FILE: &str = "video.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// 写出序列的清单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceManifest {
    pub properties: VideoProperties,
    /// 写出顺序中每帧对应的原始到达索引
    pub source_indices: Vec<usize>,
    pub corrupted: Vec<usize>,
}

pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:05}.png", index)
}

/// Removes each directory (if present) and recreates it empty.
pub fn reset_directories<P: AsRef<Path>>(directories: &[P]) -> Result<()> {
    for dir in directories {
        let dir = dir.as_ref();
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Loads every image in `dir` sorted by file name. Arrival index is the
/// position in that order.
pub fn load_frames(dir: impl AsRef<Path>) -> Result<(Vec<Frame>, VideoProperties)> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_frame_file(p))
        .collect();
    paths.sort();

    let mut frames: Vec<Frame> = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let img = image::open(path)?.to_rgb8();
        let frame = Frame::from_rgb(img, index as u64);
        if let Some(first) = frames.first() {
            first.ensure_same_shape(&frame)?;
        }
        frames.push(frame);
    }

    let properties = match read_properties(dir)? {
        Some(props) => props,
        None => match frames.first() {
            Some(first) => VideoProperties::from_frame(first, VideoProperties::DEFAULT_FPS),
            None => VideoProperties {
                fps: VideoProperties::DEFAULT_FPS,
                width: 0,
                height: 0,
            },
        },
    };

    info!(
        "📥 Loaded {} frames ({}x{} @ {:.2} FPS) from {}",
        frames.len(),
        properties.width,
        properties.height,
        properties.fps,
        dir.display()
    );
    Ok((frames, properties))
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn read_properties(dir: &Path) -> Result<Option<VideoProperties>> {
    let path = dir.join(PROPERTIES_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let props: VideoProperties = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(Some(props))
}

/// Writes the corrupted frames under their arrival index.
pub fn relocate_corrupted(
    frames: &[Frame],
    corrupted: &[usize],
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut written = Vec::with_capacity(corrupted.len());
    for &index in corrupted {
        let frame = frame_at(frames, index)?;
        let path = dir.join(frame_file_name(index));
        frame.to_rgb_image()?.save(&path)?;
        written.push(path);
    }
    if !written.is_empty() {
        warn!("🗂️ Moved {} corrupted frames to {}", written.len(), dir.display());
    }
    Ok(written)
}

/// Writes frames in `source_indices` order plus a manifest.
pub fn write_sequence(
    frames: &[Frame],
    source_indices: &[usize],
    corrupted: &[usize],
    properties: VideoProperties,
    dir: impl AsRef<Path>,
) -> Result<SequenceManifest> {
    let dir = dir.as_ref();
    for (position, &index) in source_indices.iter().enumerate() {
        let frame = frame_at(frames, index)?;
        frame.to_rgb_image()?.save(dir.join(frame_file_name(position)))?;
    }

    let manifest = SequenceManifest {
        properties,
        source_indices: source_indices.to_vec(),
        corrupted: corrupted.to_vec(),
    };
    fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;

    info!(
        "💾 Wrote {} frames to {}",
        source_indices.len(),
        dir.display()
    );
    Ok(manifest)
}

pub fn read_manifest(dir: impl AsRef<Path>) -> Result<SequenceManifest> {
    let text = fs::read_to_string(dir.as_ref().join(MANIFEST_FILE))?;
    Ok(serde_json::from_str(&text)?)
}

fn frame_at(frames: &[Frame], index: usize) -> Result<&Frame> {
    frames.get(index).ok_or_else(|| {
        RestoreError::InvalidFrame(format!(
            "index {} out of range for {} frames",
            index,
            frames.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn save_test_image(dir: &Path, name: &str, fill: u8) {
        let img = RgbImage::from_pixel(6, 4, Rgb([fill, fill / 2, 255 - fill]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_load_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        save_test_image(dir.path(), "b.png", 20);
        save_test_image(dir.path(), "a.png", 10);
        save_test_image(dir.path(), "c.bmp", 30);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (frames, props) = load_frames(dir.path()).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].data[0], 10);
        assert_eq!(frames[1].data[0], 20);
        assert_eq!(frames[2].frame_number, 2);
        assert_eq!((props.width, props.height), (6, 4));
        assert_eq!(props.fps, VideoProperties::DEFAULT_FPS);
    }

    #[test]
    fn test_properties_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        save_test_image(dir.path(), "a.png", 10);
        let props = VideoProperties {
            fps: 29.97,
            width: 6,
            height: 4,
        };
        fs::write(
            dir.path().join(PROPERTIES_FILE),
            serde_json::to_string(&props).unwrap(),
        )
        .unwrap();

        let (_, loaded) = load_frames(dir.path()).unwrap();
        assert_eq!(loaded, props);
    }

    #[test]
    fn test_mixed_sizes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        save_test_image(dir.path(), "a.png", 10);
        RgbImage::new(3, 3).save(dir.path().join("b.png")).unwrap();

        assert!(matches!(
            load_frames(dir.path()),
            Err(RestoreError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_reset_directories() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.png"), "x").unwrap();

        reset_directories(&[&out, &root.path().join("fresh")]).unwrap();
        assert!(out.exists());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
        assert!(root.path().join("fresh").is_dir());
    }

    #[test]
    fn test_write_sequence_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<Frame> = (0..3u8)
            .map(|n| Frame::new(2, 2, 3, vec![n * 50; 12], n as u64).unwrap())
            .collect();
        let props = VideoProperties::from_frame(&frames[0], 30.0);

        write_sequence(&frames, &[2, 0], &[1], props, dir.path()).unwrap();

        let first = image::open(dir.path().join(frame_file_name(0))).unwrap().to_rgb8();
        assert_eq!(first.get_pixel(0, 0)[0], 100);

        let manifest = read_manifest(dir.path()).unwrap();
        assert_eq!(manifest.source_indices, vec![2, 0]);
        assert_eq!(manifest.corrupted, vec![1]);
        assert_eq!(manifest.properties.fps, 30.0);
    }

    #[test]
    fn test_relocate_uses_arrival_index() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<Frame> = (0..4u64)
            .map(|n| Frame::new(2, 2, 1, vec![0; 4], n).unwrap())
            .collect();

        let written = relocate_corrupted(&frames, &[3], dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("frame_00003.png")]);
        assert!(written[0].exists());
        assert!(relocate_corrupted(&frames, &[9], dir.path()).is_err());
    }
}
