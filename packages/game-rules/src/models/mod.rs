pub mod config;
pub mod opinion;
pub mod patch;
pub mod player;
pub mod role;
pub mod room;
pub mod topic;
pub mod werewolf;
