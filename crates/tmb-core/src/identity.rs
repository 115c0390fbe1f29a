use std::collections::HashMap;

/// Maps Telegram sender ids to display names.
///
/// The configured nickname table is an operator override: it wins over any
/// live profile name the platform supplies. Resolution is total, falling
/// back to the stringified id.
#[derive(Clone, Debug, Default)]
pub struct IdentityResolver {
    nicknames: HashMap<i64, String>,
}

impl IdentityResolver {
    pub fn new(nicknames: HashMap<i64, String>) -> Self {
        Self { nicknames }
    }

    pub fn resolve(&self, id: i64, supplied: Option<&str>) -> String {
        if let Some(nick) = self.nicknames.get(&id) {
            return nick.clone();
        }
        match supplied {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => id.to_string(),
        }
    }
}

/// Same precedence for string-keyed platforms (Messenger per-thread
/// nicknames fetched live from the client).
pub fn pick_name(nickname: Option<&str>, supplied: Option<&str>, id: &str) -> String {
    if let Some(nick) = nickname.filter(|n| !n.is_empty()) {
        return nick.to_string();
    }
    match supplied {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(HashMap::from([(42, "Answer".to_string())]))
    }

    #[test]
    fn nickname_table_wins_over_profile_name() {
        assert_eq!(resolver().resolve(42, Some("Profile Name")), "Answer");
        assert_eq!(resolver().resolve(42, None), "Answer");
    }

    #[test]
    fn falls_back_to_profile_then_id() {
        assert_eq!(resolver().resolve(7, Some("Bob")), "Bob");
        assert_eq!(resolver().resolve(7, None), "7");
        assert_eq!(resolver().resolve(7, Some("")), "7");
    }

    #[test]
    fn pick_name_precedence() {
        assert_eq!(pick_name(Some("Nick"), Some("Live"), "123"), "Nick");
        assert_eq!(pick_name(None, Some("Live"), "123"), "Live");
        assert_eq!(pick_name(None, None, "123"), "123");
        assert_eq!(pick_name(Some(""), None, "123"), "123");
    }
}
