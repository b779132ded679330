pub mod imgbb;
pub mod mail;
