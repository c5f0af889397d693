//! Comma separated set of docker compose profiles held in one variable.

use std::fmt;

/// Insertion ordered set with no duplicate or empty members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSet {
    members: Vec<String>,
}

impl ProfileSet {
    /// Split on `,`, trim tokens, drop empties and repeats.
    pub fn parse(raw: &str) -> Self {
        let mut set = Self::default();
        for token in raw.split(',') {
            set.insert(token);
        }
        set
    }

    pub fn contains(&self, profile: &str) -> bool {
        self.members.iter().any(|m| m == profile.trim())
    }

    /// Returns `true` when the set changed.
    pub fn insert(&mut self, profile: &str) -> bool {
        let profile = profile.trim();
        if profile.is_empty() || self.contains(profile) {
            return false;
        }
        self.members.push(profile.to_string());
        true
    }

    /// Returns `true` when the set changed.
    pub fn remove(&mut self, profile: &str) -> bool {
        let profile = profile.trim();
        let before = self.members.len();
        self.members.retain(|m| m != profile);
        self.members.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Display for ProfileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.members.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_tokens() {
        let set = ProfileSet::parse(" db, github,,db ,  ");
        assert_eq!(set.to_string(), "db,github");
    }

    #[test]
    fn insert_and_remove_report_changes() {
        let mut set = ProfileSet::parse("db");
        assert!(set.insert("github"));
        assert!(!set.insert("github"));
        assert!(!set.insert("  "));
        assert!(set.remove("db"));
        assert!(!set.remove("db"));
        assert_eq!(set.iter().collect::<Vec<_>>(), ["github"]);
    }
}
