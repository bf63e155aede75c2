pub mod match_request;
pub mod team;
