// depth_map.rs — CPU 端深度图
//
// 与 GPU 端一致：R 通道、最近邻采样、U 方向 Repeat、V 方向 Clamp。

use crate::displacement::texture_coords;

/// Flat fallback value used when a scene has no depth source.
pub const NEUTRAL_DEPTH: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    width: u32,
    height: u32,
    /// Row-major, top row first.
    samples: Vec<f32>,
}

impl DepthMap {
    /// Returns `None` when `samples` does not hold exactly `width * height` values.
    pub fn new(width: u32, height: u32, samples: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || samples.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            samples,
        })
    }

    /// A 1x1 map with the neutral depth: every vertex is displaced equally, no parallax.
    pub fn flat() -> Self {
        Self {
            width: 1,
            height: 1,
            samples: vec![NEUTRAL_DEPTH],
        }
    }

    /// Red channel of any decoded image, normalized to [0, 1] for integer formats.
    pub fn from_image(img: &image::DynamicImage) -> Self {
        let rgba = img.to_rgba32f();
        let (width, height) = rgba.dimensions();
        let samples = rgba.pixels().map(|p| p[0]).collect();
        Self {
            width,
            height,
            samples,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn is_flat(&self) -> bool {
        self.samples.windows(2).all(|w| w[0] == w[1])
    }

    pub fn texel(&self, x: u32, y: u32) -> f32 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.samples[(y * self.width + x) as usize]
    }

    /// Nearest-neighbour copy no larger than `max_dimension` on either side,
    /// `None` when the map already fits.
    pub fn downsampled(&self, max_dimension: u32) -> Option<DepthMap> {
        if self.width <= max_dimension && self.height <= max_dimension {
            return None;
        }
        let scale = max_dimension as f32 / self.width.max(self.height) as f32;
        let width = ((self.width as f32 * scale) as u32).clamp(1, max_dimension);
        let height = ((self.height as f32 * scale) as u32).clamp(1, max_dimension);
        let mut samples = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let sx = x * self.width / width;
                let sy = y * self.height / height;
                samples.push(self.texel(sx, sy));
            }
        }
        Some(DepthMap {
            width,
            height,
            samples,
        })
    }

    /// Sample at a surface UV the way the vertex stage does: seam offset,
    /// epsilon clamp, vertical flip to image rows, nearest texel.
    pub fn sample(&self, u: f32, v: f32, seam_fix: f32) -> f32 {
        let [tu, tv] = texture_coords(u, v, seam_fix);
        self.sample_texture(tu, tv)
    }

    /// Nearest-texel lookup at a texture coordinate (row 0 = tv 0).
    pub fn sample_texture(&self, tu: f32, tv: f32) -> f32 {
        let tu = tu - tu.floor();
        let tv = tv.clamp(0.0, 1.0);
        let x = ((tu * self.width as f32).floor() as u32).min(self.width - 1);
        let y = ((tv * self.height as f32).floor() as u32).min(self.height - 1);
        self.texel(x, y)
    }
}
