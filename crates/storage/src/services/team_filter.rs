use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::{Region, Team, city_key, covers_area, normalize_part};

/// Directory filter. Unset fields (absent, blank or the "any" placeholder) match every team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeamFilter {
    pub city: Option<String>,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
    pub skill: Option<String>,
}

impl TeamFilter {
    pub fn normalized(&self) -> Self {
        Self {
            city: normalize_part(self.city.as_deref()),
            district: normalize_part(self.district.as_deref()),
            neighborhood: normalize_part(self.neighborhood.as_deref()),
            skill: normalize_part(self.skill.as_deref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        let filter = self.normalized();
        filter.city.is_none()
            && filter.district.is_none()
            && filter.neighborhood.is_none()
            && filter.skill.is_none()
    }

    pub fn matches(&self, team: &Team) -> bool {
        let filter = self.normalized();

        let region_ok = match team.structured_region() {
            Some(region) => filter.matches_structured(&region),
            None => filter.matches_label(&team.region),
        };

        region_ok
            && filter
                .skill
                .as_deref()
                .is_none_or(|skill| team.has_skill(skill))
    }

    /// Keeps matching teams in their original order.
    pub fn apply(&self, teams: &[Team]) -> Vec<Team> {
        teams.iter().filter(|t| self.matches(t)).cloned().collect()
    }

    // Cities compare by their short form; districts and neighborhoods by whole words,
    // so "성남시" finds "성남시 분당구" but "강남" does not find "강남구".
    fn matches_structured(&self, region: &Region) -> bool {
        fn level(wanted: Option<&str>, actual: Option<&str>) -> bool {
            wanted.is_none_or(|w| actual.is_some_and(|a| covers_area(a, w)))
        }

        self.city
            .as_deref()
            .is_none_or(|w| region.city.as_deref().is_some_and(|a| city_key(a) == city_key(w)))
            && level(self.district.as_deref(), region.district.as_deref())
            && level(self.neighborhood.as_deref(), region.neighborhood.as_deref())
    }

    // Rows registered before the structured columns existed only carry the label;
    // the city is matched on its first two characters ("서울특별시" -> "서울")
    // or on the short form of the label's first word ("충청북도" -> "충북").
    fn matches_label(&self, label: &str) -> bool {
        let city_ok = self.city.as_deref().is_none_or(|city| {
            let short: String = city.chars().take(2).collect();
            label.contains(&short)
                || label
                    .split_whitespace()
                    .next()
                    .is_some_and(|first| city_key(first) == city_key(city))
        });

        city_ok
            && self
                .district
                .as_deref()
                .is_none_or(|district| label.contains(district))
            && self
                .neighborhood
                .as_deref()
                .is_none_or(|neighborhood| label.contains(neighborhood))
    }
}
