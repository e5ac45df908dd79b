use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::resources::user::{Id, User};

/// Opaque pagination token of a follower listing.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Cursor(pub String);

impl Cursor {
    /// Cursor requesting the first page of a listing.
    pub fn start() -> Self {
        Cursor("-1".to_owned())
    }

    /// Whether the remote signalled that there are no more pages.
    pub fn is_exhausted(&self) -> bool {
        self.0.is_empty() || self.0 == "0"
    }
}

impl Display for Cursor {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FollowerPage {
    #[serde(rename = "next_cursor_str", default)]
    pub next_cursor: Cursor,
    #[serde(rename = "users", default)]
    pub followers: Vec<User>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FollowerIdPage {
    #[serde(rename = "next_cursor_str", default)]
    pub next_cursor: Cursor,
    #[serde(rename = "ids", default)]
    pub followers: Vec<Id>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::user::ScreenName;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_follower_page_from_json() {
        let page: FollowerPage = serde_json::from_str(
            r#"{"next_cursor_str": "3333", "users":[ {"screen_name": "boblechef", "id": 2920819021}]}"#,
        )
        .unwrap();
        assert_eq!(page.next_cursor, Cursor("3333".to_owned()));
        assert_eq!(
            page.followers[0].screen_name,
            ScreenName("boblechef".to_owned())
        );
    }

    #[test]
    fn test_follower_id_page_without_cursor_is_last() {
        let page: FollowerIdPage = serde_json::from_str(r#"{"ids": [1492, 1793]}"#).unwrap();
        assert_eq!(page.followers, vec![Id(1492), Id(1793)]);
        assert!(page.next_cursor.is_exhausted());
    }

    #[test]
    fn test_cursor_is_exhausted() {
        assert!(Cursor("0".to_owned()).is_exhausted());
        assert!(Cursor(String::new()).is_exhausted());
        assert!(!Cursor::start().is_exhausted());
        assert!(!Cursor("1374004777531007833".to_owned()).is_exhausted());
    }
}
