pub mod match_request;
pub mod outbox;
pub mod team;

pub use match_request::MatchRequestRepository;
pub use outbox::OutboxRepository;
pub use team::TeamRepository;
