// controls.rs — 视角参数与运行时控制

use crate::projection::DepthParams;

pub const DEFAULT_FOV: f32 = 75.0;
pub const SCALE_STEP: f32 = 0.5;
pub const SCALE_FLOOR: f32 = 0.5;
pub const EXPOSURE_STEP: f32 = 0.1;
pub const EXPOSURE_FLOOR: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ToggleAuthoring,
    ToggleDebugDepth,
    ToggleFlip,
    IncreaseScale,
    DecreaseScale,
    IncreaseExposure,
    DecreaseExposure,
    ExportHotspots,
}

/// What the event loop has to do after a control was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlEffect {
    /// Depth parameters changed: UV-anchored hotspots and the picking surface must follow.
    pub reproject: bool,
    pub export: bool,
}

pub struct ViewerState {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub sensitivity_scale: f32,
    pub is_fullscreen: bool,

    pub depth: DepthParams,
    pub exposure: f32,
    pub debug_depth: bool,
    pub authoring: bool,
}

impl ViewerState {
    pub fn new(depth: DepthParams, exposure: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: DEFAULT_FOV,
            sensitivity_scale: 1.0,
            is_fullscreen: false,
            depth: DepthParams {
                scale: depth.scale.max(SCALE_FLOOR),
                ..depth
            },
            exposure: exposure.max(EXPOSURE_FLOOR),
            debug_depth: false,
            authoring: false,
        }
    }

    pub fn reset_view(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.fov = DEFAULT_FOV;
    }

    pub fn apply(&mut self, control: Control) -> ControlEffect {
        let mut effect = ControlEffect::default();
        match control {
            Control::ToggleAuthoring => {
                self.authoring = !self.authoring;
                log::info!("authoring mode {}", on_off(self.authoring));
            }
            Control::ToggleDebugDepth => {
                self.debug_depth = !self.debug_depth;
                log::info!("depth view {}", on_off(self.debug_depth));
            }
            Control::ToggleFlip => {
                self.depth.flip = !self.depth.flip;
                log::info!("depth flip {}", on_off(self.depth.flip));
                effect.reproject = true;
            }
            Control::IncreaseScale | Control::DecreaseScale => {
                let step = if control == Control::IncreaseScale {
                    SCALE_STEP
                } else {
                    -SCALE_STEP
                };
                let scale = (self.depth.scale + step).max(SCALE_FLOOR);
                effect.reproject = scale != self.depth.scale;
                self.depth.scale = scale;
                log::info!("depth scale {:.2}", scale);
            }
            Control::IncreaseExposure => {
                self.exposure += EXPOSURE_STEP;
                log::info!("exposure {:.2}", self.exposure);
            }
            Control::DecreaseExposure => {
                self.exposure = (self.exposure - EXPOSURE_STEP).max(EXPOSURE_FLOOR);
                log::info!("exposure {:.2}", self.exposure);
            }
            Control::ExportHotspots => effect.export = true,
        }
        effect
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ViewerState {
        ViewerState::new(DepthParams::default(), 1.0)
    }

    #[test]
    fn scale_decrements_stop_at_floor() {
        let mut s = state();
        assert_eq!(s.depth.scale, 3.0);
        let mut seen = Vec::new();
        for _ in 0..10 {
            s.apply(Control::DecreaseScale);
            seen.push(s.depth.scale);
        }
        assert!(seen.iter().all(|&x| x >= SCALE_FLOOR));
        assert_eq!(s.depth.scale, 0.5);
        assert_eq!(seen[..5], [2.5, 2.0, 1.5, 1.0, 0.5]);
    }

    #[test]
    fn scale_and_flip_request_reprojection() {
        let mut s = state();
        assert!(s.apply(Control::IncreaseScale).reproject);
        assert!(s.apply(Control::ToggleFlip).reproject);
        assert!(!s.apply(Control::ToggleDebugDepth).reproject);
        assert!(!s.apply(Control::IncreaseExposure).reproject);
    }

    #[test]
    fn scale_at_floor_does_not_reproject() {
        let mut s = ViewerState::new(DepthParams { scale: 0.5, ..Default::default() }, 1.0);
        assert!(!s.apply(Control::DecreaseScale).reproject);
    }

    #[test]
    fn exposure_has_floor_but_no_ceiling() {
        let mut s = state();
        for _ in 0..50 {
            s.apply(Control::DecreaseExposure);
        }
        assert_eq!(s.exposure, EXPOSURE_FLOOR);
        for _ in 0..100 {
            s.apply(Control::IncreaseExposure);
        }
        assert!(s.exposure > 10.0);
    }

    #[test]
    fn flip_twice_restores_params() {
        let mut s = state();
        let before = s.depth;
        s.apply(Control::ToggleFlip);
        s.apply(Control::ToggleFlip);
        assert_eq!(s.depth, before);
    }

    #[test]
    fn initial_values_are_clamped_to_floors() {
        let s = ViewerState::new(DepthParams { scale: 0.1, ..Default::default() }, 0.0);
        assert_eq!(s.depth.scale, SCALE_FLOOR);
        assert_eq!(s.exposure, EXPOSURE_FLOOR);
    }

    #[test]
    fn export_is_only_an_effect() {
        let mut s = state();
        let e = s.apply(Control::ExportHotspots);
        assert!(e.export && !e.reproject);
    }
}
