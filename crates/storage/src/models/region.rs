use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Placeholder the region selectors use for "no selection".
pub const ANY_REGION: &str = "전체";

/// Structured location of a team: city, district, neighborhood.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Region {
    pub city: Option<String>,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
}

impl Region {
    pub fn new(city: Option<&str>, district: Option<&str>, neighborhood: Option<&str>) -> Self {
        Self {
            city: normalize_part(city),
            district: normalize_part(district),
            neighborhood: normalize_part(neighborhood),
        }
    }

    /// Space separated label stored in the denormalized `region` column.
    pub fn label(&self) -> String {
        [&self.city, &self.district, &self.neighborhood]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.district.is_none() && self.neighborhood.is_none()
    }
}

/// Trims a selector value and maps blanks and the "any" placeholder to `None`.
pub fn normalize_part(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ANY_REGION)
        .map(String::from)
}

// Official names of the first-level divisions and the short forms the address widget reports.
const CITY_SHORT_NAMES: &[(&str, &str)] = &[
    ("서울특별시", "서울"),
    ("서울시", "서울"),
    ("부산광역시", "부산"),
    ("대구광역시", "대구"),
    ("인천광역시", "인천"),
    ("광주광역시", "광주"),
    ("대전광역시", "대전"),
    ("울산광역시", "울산"),
    ("세종특별자치시", "세종"),
    ("경기도", "경기"),
    ("강원도", "강원"),
    ("강원특별자치도", "강원"),
    ("충청북도", "충북"),
    ("충청남도", "충남"),
    ("전라북도", "전북"),
    ("전북특별자치도", "전북"),
    ("전라남도", "전남"),
    ("경상북도", "경북"),
    ("경상남도", "경남"),
    ("제주도", "제주"),
    ("제주특별자치도", "제주"),
];

/// Canonical comparison key of a city: "서울특별시" and "서울" both become "서울".
pub fn city_key(city: &str) -> &str {
    let city = city.trim();
    CITY_SHORT_NAMES
        .iter()
        .find(|(official, _)| *official == city)
        .map_or(city, |(_, short)| short)
}

/// Whether `wanted` names the same place as `actual`, or one of its enclosing parts.
/// Compound districts such as "성남시 분당구" match both "성남시" and "분당구".
pub fn covers_area(actual: &str, wanted: &str) -> bool {
    let actual: Vec<&str> = actual.split_whitespace().collect();
    let wanted: Vec<&str> = wanted.split_whitespace().collect();
    !wanted.is_empty()
        && wanted.len() <= actual.len()
        && actual.windows(wanted.len()).any(|window| window == wanted.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_joins_present_parts() {
        let region = Region::new(Some("서울특별시"), Some("강남구"), Some("역삼동"));
        assert_eq!(region.label(), "서울특별시 강남구 역삼동");
    }

    #[test]
    fn test_label_skips_placeholder_and_blank_parts() {
        let region = Region::new(Some("서울특별시"), Some(ANY_REGION), Some("  "));
        assert_eq!(region.label(), "서울특별시");
        assert_eq!(region.district, None);
    }

    #[test]
    fn test_city_key_folds_official_names() {
        assert_eq!(city_key("서울특별시"), "서울");
        assert_eq!(city_key(" 서울 "), "서울");
        assert_eq!(city_key("충청북도"), "충북");
        assert_eq!(city_key("전북특별자치도"), city_key("전라북도"));
        assert_eq!(city_key("Atlantis"), "Atlantis");
    }

    #[test]
    fn test_covers_area_matches_whole_words() {
        assert!(covers_area("성남시 분당구", "성남시"));
        assert!(covers_area("성남시 분당구", "분당구"));
        assert!(covers_area("성남시 분당구", " 성남시  분당구 "));
        assert!(covers_area("강남구", "강남구"));
        assert!(!covers_area("강남구", "강남"));
        assert!(!covers_area("성남시", "성남시 분당구"));
    }

    #[test]
    fn test_empty_region() {
        let region = Region::new(None, Some(ANY_REGION), None);
        assert!(region.is_empty());
        assert_eq!(region.label(), "");
    }
}
