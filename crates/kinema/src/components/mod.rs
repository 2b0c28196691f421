pub mod body;
pub mod channels;
pub mod edges;
pub mod entity;
pub mod motion;
pub mod rect;
