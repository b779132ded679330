pub mod prelude;

pub mod accounts;
pub mod events;
pub mod gallery_images;
pub mod role_ranks;
pub mod roster_members;
pub mod year_visibility;
