pub mod auth;
pub mod dashboard;
pub mod errors;
pub mod sites;
