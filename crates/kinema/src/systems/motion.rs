use crate::components::body::Body;
use crate::core::time::FrameTime;

/// Integrate every active body that has a motion component.
pub fn integrate_all<B: Body>(bodies: &mut [B], frame: &FrameTime) {
    for body in bodies.iter_mut().filter(|b| b.is_active()) {
        if let Some((motion, rect)) = body.split_motion() {
            motion.integrate(rect, frame);
        }
    }
}
