pub mod api;
pub mod components;
pub mod core;
pub mod error;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::config::{vector_from_json, EngineConfig};
pub use api::game::{EngineContext, Game};
pub use api::types::{ContactEvent, Direction, EntityId, WALL_TAG};
pub use components::body::Body;
pub use components::channels::{Transition, TransitionBuffer, VelocityChannels};
pub use components::edges::EdgeMask;
pub use components::entity::Sprite;
pub use components::motion::{ForceCaps, ForceMode, MovingBody};
pub use components::rect::Rect;
pub use core::group::Group;
pub use core::time::{ClockTick, FrameClock, FrameTime};
pub use error::{KinemaError, Result};
pub use systems::bounds::BoundsConstraint;
pub use systems::collision::{CollisionResolver, RevertPolicy, DEFAULT_PENETRATION_THRESHOLD};
pub use systems::forces::ForceField;
pub use systems::motion::integrate_all;

#[cfg(feature = "physics")]
pub use core::physics::{
    ContactTarget, RigidContact, RigidHandle, RigidKind, RigidMaterial, RigidSpace,
    JUMP_RESET_SPEED,
};
