pub mod account;
pub mod contact;
pub mod match_requests;
pub mod teams;
