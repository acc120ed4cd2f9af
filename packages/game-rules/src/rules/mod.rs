pub mod actions;
pub mod day_vote;
pub mod majority;
pub mod night;
pub mod phase;
pub mod role_assignment;
pub mod winning_judgement;
