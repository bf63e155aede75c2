use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    #[default]
    Soccer,
    Futsal,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soccer => "soccer",
            Self::Futsal => "futsal",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
