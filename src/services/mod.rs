pub mod auth;
pub mod bootstrap_admin;
pub mod group;
pub mod post;
pub mod user;
