pub mod root;
pub mod auth;
pub mod announcements;
pub mod credits;
pub mod users;
pub mod documents;
