pub mod actor;
pub mod auth;
pub mod common;
pub mod search;
pub mod share;
pub mod site;
pub mod user;
pub mod video;
pub mod vip;
