use std::collections::BTreeMap;

/// Opaque, session-stable player identifier handed out by the identity layer.
pub type PlayerId = String;

/// The display name for `player_id`, or a masked form of the id when the
/// player never set one.
pub fn display_name(names: &BTreeMap<PlayerId, String>, player_id: &str) -> String {
    match names.get(player_id) {
        Some(name) => name.clone(),
        None => {
            let masked: String = player_id.chars().take(5).collect();
            format!("Player {}...", masked)
        }
    }
}
