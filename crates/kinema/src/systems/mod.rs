pub mod bounds;
pub mod collision;
pub mod forces;
pub mod motion;
