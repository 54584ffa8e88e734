pub mod conversation;
pub mod lead;
pub mod meeting;
pub mod profile;
pub mod tenant;
