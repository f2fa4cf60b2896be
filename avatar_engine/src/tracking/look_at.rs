//! 视线目标跟随

use glam::{Vec2, Vec3};

/// 视线目标，挂在相机下的本地坐标
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LookAt {
    pub position: Vec3,
    pub destination: Vec3,
}

impl LookAt {
    /// 由瞳孔偏移更新目标点并插值跟随
    ///
    /// 画面是镜像的，所以 x 取反。瞳孔数据无效时保持上一帧。
    pub fn update(&mut self, pupil: Vec2, scale: f32, rate: f32) {
        let destination = Vec3::new(-scale * pupil.x, scale * pupil.y, 0.0);
        if !destination.is_finite() {
            return;
        }
        self.destination = destination;
        let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        self.position = self.position.lerp(self.destination, rate);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
