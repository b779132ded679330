pub mod account;
pub mod event;
pub mod gallery;
pub mod role_rank;
pub mod roster;
pub mod visibility;
