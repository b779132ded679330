pub use super::accounts::Entity as Accounts;
pub use super::events::Entity as Events;
pub use super::gallery_images::Entity as GalleryImages;
pub use super::role_ranks::Entity as RoleRanks;
pub use super::roster_members::Entity as RosterMembers;
pub use super::year_visibility::Entity as YearVisibility;
