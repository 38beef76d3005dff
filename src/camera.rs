// camera.rs — 球心相机
//
// 相机固定在原点；yaw/pitch 与 projection::sphere_point 同一约定
// (yaw = 0, pitch = 0 看向 +Z，即图像中心)。

use glam::{Mat4, Vec2, Vec3, Vec4};

pub const Z_NEAR: f32 = 0.01;
pub const Z_FAR: f32 = 1000.0;

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub fov_deg: f32,
    pub width: f32,
    pub height: f32,
}

impl Camera {
    pub fn forward(&self) -> Vec3 {
        let yaw = self.yaw_deg.to_radians();
        let pitch = self.pitch_deg.clamp(-89.9, 89.9).to_radians();
        Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos())
    }

    fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn view(&self) -> Mat4 {
        // 从球内观看，X 镜像后图像左右方向与原图一致
        Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))
            * Mat4::look_at_rh(Vec3::ZERO, self.forward(), Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        let fov = self.fov_deg.clamp(1.0, 179.0).to_radians();
        Mat4::perspective_rh(fov, self.aspect(), Z_NEAR, Z_FAR)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Pixel position of a world point, `None` when it is behind the camera.
    pub fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.view_proj() * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
        ))
    }

    /// Unit direction of the ray from the camera through a pixel.
    pub fn screen_ray(&self, pixel: Vec2) -> Vec3 {
        let ndc_x = pixel.x / self.width.max(1.0) * 2.0 - 1.0;
        let ndc_y = 1.0 - pixel.y / self.height.max(1.0) * 2.0;
        let inv = self.view_proj().inverse();
        let far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = inv * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = far.truncate() / far.w;
        let near = near.truncate() / near.w;
        (far - near).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::sphere_point;

    fn camera(yaw: f32, pitch: f32) -> Camera {
        Camera {
            yaw_deg: yaw,
            pitch_deg: pitch,
            fov_deg: 60.0,
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn forward_follows_equirect_convention() {
        let c = camera(90.0, 0.0);
        assert!(c.forward().distance(sphere_point(0.75, 0.5)) < 1e-5);
        let c = camera(0.0, 45.0);
        assert!(c.forward().distance(sphere_point(0.5, 0.75)) < 1e-5);
    }

    #[test]
    fn look_direction_projects_to_screen_center() {
        let c = camera(30.0, -20.0);
        let center = c.world_to_screen(c.forward() * 3.0).unwrap();
        assert!(center.distance(Vec2::new(400.0, 300.0)) < 1e-2);
    }

    #[test]
    fn points_behind_are_hidden() {
        let c = camera(0.0, 0.0);
        assert!(c.world_to_screen(Vec3::new(0.0, 0.0, -2.0)).is_none());
    }

    #[test]
    fn screen_ray_inverts_world_to_screen() {
        let c = camera(-40.0, 10.0);
        let target = sphere_point(0.4, 0.55) * 2.0;
        let pixel = c.world_to_screen(target).unwrap();
        let ray = c.screen_ray(pixel);
        assert!(ray.distance(target.normalize()) < 1e-3);
    }

    #[test]
    fn right_half_of_image_is_on_screen_right() {
        let c = camera(0.0, 0.0);
        let right = c.world_to_screen(sphere_point(0.55, 0.5)).unwrap();
        assert!(right.x > 400.0);
    }
}
