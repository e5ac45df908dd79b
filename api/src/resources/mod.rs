pub mod follower;
pub mod user;
