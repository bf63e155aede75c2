pub mod team_filter;

pub use team_filter::TeamFilter;
