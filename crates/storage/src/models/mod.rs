mod match_request;
mod match_type;
mod outbox;
mod region;
mod skill_level;
mod team;

pub use match_request::{AlreadyResolved, Decision, MatchRequest, MatchStatus, NewMatchRequest};
pub use match_type::MatchType;
pub use outbox::{DeliveryStatus, FailureDisposition, NewNotification, OutboxEntry};
pub use region::{ANY_REGION, Region, city_key, covers_area, normalize_part};
pub use skill_level::SkillLevel;
pub use team::{NO_ADDRESS, Team, TeamFields};
