// config.rs — 命令行 / 环境变量配置

use crate::controls::{EXPOSURE_FLOOR, SCALE_FLOOR};
use crate::projection::DepthParams;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "parallax_panorama")]
#[command(about = "Equirectangular panorama viewer with depth parallax and hotspots")]
pub struct Config {
    /// Scene manifest (JSON with `start` and `scenes`).
    #[arg(long, env = "PANORAMA_MANIFEST", default_value = "scenes.json")]
    pub manifest: PathBuf,

    #[arg(long, env = "PANORAMA_DEPTH_SCALE", default_value_t = 3.0)]
    pub depth_scale: f32,

    #[arg(long, env = "PANORAMA_DEPTH_BIAS", default_value_t = 0.0, allow_negative_numbers = true)]
    pub depth_bias: f32,

    /// Treat bright depth values as near instead of far.
    #[arg(long, env = "PANORAMA_DEPTH_FLIP")]
    pub depth_flip: bool,

    /// Horizontal texture offset hiding the wrap seam.
    #[arg(long, env = "PANORAMA_SEAM_FIX", default_value_t = 0.0, allow_negative_numbers = true)]
    pub seam_fix: f32,

    #[arg(long, env = "PANORAMA_EXPOSURE", default_value_t = 1.0)]
    pub exposure: f32,

    /// Sphere rows (pole to pole).
    #[arg(long, default_value_t = 256)]
    pub mesh_lat: usize,

    /// Sphere columns (around the equator).
    #[arg(long, default_value_t = 512)]
    pub mesh_lon: usize,

    /// Start in authoring mode.
    #[arg(long)]
    pub authoring: bool,
}

impl Config {
    pub fn depth_params(&self) -> DepthParams {
        let scale = if self.depth_scale < SCALE_FLOOR {
            log::warn!(
                "depth scale {} below floor, using {}",
                self.depth_scale,
                SCALE_FLOOR
            );
            SCALE_FLOOR
        } else {
            self.depth_scale
        };
        DepthParams {
            scale,
            bias: self.depth_bias,
            flip: self.depth_flip,
            seam_fix: self.seam_fix,
        }
    }

    pub fn exposure(&self) -> f32 {
        if self.exposure < EXPOSURE_FLOOR {
            log::warn!("exposure {} below floor, using {}", self.exposure, EXPOSURE_FLOOR);
            EXPOSURE_FLOOR
        } else {
            self.exposure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::try_parse_from(["parallax_panorama"]).unwrap();
        assert_eq!(c.manifest, PathBuf::from("scenes.json"));
        assert_eq!(c.depth_params(), DepthParams::default());
        assert_eq!(c.exposure(), 1.0);
    }

    #[test]
    fn parses_depth_flags_and_clamps_scale() {
        let c = Config::try_parse_from([
            "parallax_panorama",
            "--manifest",
            "tour/scenes.json",
            "--depth-scale",
            "0.1",
            "--depth-bias",
            "-0.2",
            "--depth-flip",
        ])
        .unwrap();
        let p = c.depth_params();
        assert_eq!(p.scale, SCALE_FLOOR);
        assert_eq!(p.bias, -0.2);
        assert!(p.flip);
    }
}
