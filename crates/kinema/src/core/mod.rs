pub mod group;
#[cfg(feature = "physics")]
pub mod physics;
pub mod time;
