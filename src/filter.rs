use serde::{Deserialize, Serialize};

use crate::Keypoint;

/// Axis aligned rectangle in pixel units. Containment is inclusive on all
/// four edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Roi {
    /// The preceding vehicle in the KITTI sequence the sweep was built for.
    pub const VEHICLE: Roi = Roi {
        x: 535.,
        y: 180.,
        width: 180.,
        height: 150.,
    };

    pub fn contains(&self, kp: &Keypoint) -> bool {
        let (x_max, y_max) = (self.x + self.width, self.y + self.height);
        kp.x >= self.x && kp.x <= x_max && kp.y >= self.y && kp.y <= y_max
    }

    /// Keypoints inside the rectangle, in their original order.
    pub fn filter(&self, keypoints: &[Keypoint]) -> Vec<Keypoint> {
        keypoints.iter().filter(|kp| self.contains(kp)).copied().collect()
    }

    pub fn retain(&self, keypoints: &mut Vec<Keypoint>) {
        keypoints.retain(|kp| self.contains(kp));
    }
}

impl Default for Roi {
    fn default() -> Self {
        Roi::VEHICLE
    }
}

/// Keep the `n` keypoints with the highest response, plus any that tie with
/// the `n`-th one.
///
/// Ties keep their detection order. The survivors come back sorted by
/// descending response.
pub fn retain_best(keypoints: &mut Vec<Keypoint>, n: usize) {
    if keypoints.len() <= n {
        return;
    }
    if n == 0 {
        keypoints.clear();
        return;
    }
    keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
    let boundary = keypoints[n - 1].response;
    let keep = n + keypoints[n..]
        .iter()
        .take_while(|kp| kp.response >= boundary)
        .count();
    keypoints.truncate(keep);
}
