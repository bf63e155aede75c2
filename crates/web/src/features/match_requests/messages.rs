//! Text message bodies for the match request lifecycle.

use storage::models::MatchRequest;

const BRAND: &str = "[MatchVibe]";

pub fn request_received(
    to_team_name: &str,
    from_team_name: &str,
    from_team_region: Option<&str>,
    app_url: &str,
) -> String {
    let region = from_team_region
        .filter(|r| !r.trim().is_empty())
        .map(|r| format!(" ({r})"))
        .unwrap_or_default();

    format!(
        "{BRAND} Hello, {to_team_name} manager!\n\n\
         \"{from_team_name}\"{region} has asked your team for a match.\n\n\
         Accept or decline it under MatchVibe > My team:\n{app_url}/my-team"
    )
}

/// Sent to the requesting team once the target team accepts.
pub fn accepted_for_requester(request: &MatchRequest, target_contact: Option<&str>) -> String {
    let reach = match target_contact {
        Some(contact) => format!("Contact them at {contact} to arrange the game."),
        None => "They have not listed a contact number; check their team page.".to_string(),
    };

    format!(
        "{BRAND} \"{}\" accepted your match request!\n\n{reach}",
        request.to_team_name
    )
}

/// Copy for the accepting team, carrying the requester's number.
pub fn accepted_for_target(request: &MatchRequest) -> String {
    let contact = request
        .from_team_contact
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("not provided");

    format!(
        "{BRAND} You accepted the match request from \"{}\".\n\nTheir contact: {contact}",
        request.from_team_name
    )
}

pub fn rejected_for_requester(request: &MatchRequest, app_url: &str) -> String {
    format!(
        "{BRAND} \"{}\" declined your match request.\n\n\
         Find another opponent on MatchVibe:\n{app_url}/matches",
        request.to_team_name
    )
}
