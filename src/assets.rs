// assets.rs — 资源加载与格式回退链
//
// 颜色: pano.png -> pano.jpg（全部失败则场景加载失败）
// 深度: depth.exr -> depth.png -> 平面深度（不会失败）

use crate::depth_map::DepthMap;
use crate::error::{Result, ViewerError};
use image::io::Reader as ImageReader;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const COLOR_CHAIN: [&str; 2] = ["pano.png", "pano.jpg"];
pub const DEPTH_CHAIN: [&str; 2] = ["depth.exr", "depth.png"];
pub const HOTSPOTS_FILE: &str = "hotspots.json";

/// Where a scene's depth came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DepthSource {
    File(PathBuf),
    Flat,
}

fn decode(path: &Path) -> Result<image::DynamicImage> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut reader = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    reader.no_limits();
    Ok(reader.decode()?)
}

/// Try each candidate in order; the first one that decodes wins.
fn first_decodable(dir: &Path, chain: &[&str]) -> std::result::Result<(PathBuf, image::DynamicImage), Vec<PathBuf>> {
    let mut tried = Vec::with_capacity(chain.len());
    for name in chain {
        let path = dir.join(name);
        match decode(&path) {
            Ok(img) => return Ok((path, img)),
            Err(e) => {
                log::debug!("{} unavailable: {}", path.display(), e);
                tried.push(path);
            }
        }
    }
    Err(tried)
}

pub fn load_color(dir: &Path) -> Result<(PathBuf, image::RgbaImage)> {
    match first_decodable(dir, &COLOR_CHAIN) {
        Ok((path, img)) => {
            log::info!("color image {} ({}x{})", path.display(), img.width(), img.height());
            Ok((path, img.to_rgba8()))
        }
        Err(tried) => Err(ViewerError::AssetNotFound {
            kind: "color image",
            tried,
        }),
    }
}

pub fn load_depth(dir: &Path) -> (DepthSource, DepthMap) {
    match first_decodable(dir, &DEPTH_CHAIN) {
        Ok((path, img)) => {
            log::info!("depth map {} ({}x{})", path.display(), img.width(), img.height());
            (DepthSource::File(path), DepthMap::from_image(&img))
        }
        Err(tried) => {
            log::warn!(
                "no depth source in {} (tried {:?}), using flat depth",
                dir.display(),
                tried
            );
            (DepthSource::Flat, DepthMap::flat())
        }
    }
}

/// Raw hotspot list text; `None` when the scene has no readable list.
pub fn read_hotspot_list(dir: &Path) -> Option<String> {
    let path = dir.join(HOTSPOTS_FILE);
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            log::warn!("cannot read {}: {}, scene has no hotspots", path.display(), e);
            None
        }
    }
}

/// 超出 GPU 限制时等比缩小
pub fn fit_to_limit(img: image::RgbaImage, max_dimension: u32) -> image::RgbaImage {
    let (src_w, src_h) = img.dimensions();
    if src_w <= max_dimension && src_h <= max_dimension {
        return img;
    }
    let scale = (max_dimension as f32 / src_w.max(src_h) as f32).min(1.0);
    let new_w = ((src_w as f32 * scale) as u32).max(1);
    let new_h = ((src_h as f32 * scale) as u32).max(1);
    log::warn!(
        "image {}x{} exceeds GPU limit {}, scaled to {}x{}",
        src_w,
        src_h,
        max_dimension,
        new_w,
        new_h
    );
    image::DynamicImage::ImageRgba8(img)
        .resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3)
        .to_rgba8()
}
