use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub u64);

impl FromStr for Id {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        string.parse().map(Id).map_err(|_| Error::BadUserId {
            identifier: string.into(),
        })
    }
}

impl Display for Id {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct ScreenName(pub String);

impl FromStr for ScreenName {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        let string = string.strip_prefix('@').unwrap_or(string);
        if !string.is_empty() && string.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(ScreenName(string.into()))
        } else {
            Err(Error::BadScreenName {
                identifier: string.into(),
            })
        }
    }
}

impl Display for ScreenName {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: Id,
    pub screen_name: ScreenName,
}

/// Only the id of a user, as returned by lookups that do not ask for entities.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub(crate) struct IdHolder {
    pub id: Id,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_user_from_json() {
        let user: User =
            serde_json::from_str(r#"{"screen_name": "boblechef", "id": 2920819021}"#).unwrap();
        assert_eq!(
            user,
            User {
                id: Id(2920819021),
                screen_name: ScreenName("boblechef".to_owned()),
            }
        );
    }

    #[test]
    fn test_screen_name_from_str() {
        assert_eq!(
            "@bob_le_chef".parse::<ScreenName>().unwrap(),
            ScreenName("bob_le_chef".to_owned())
        );
        assert!("bob/le/chef".parse::<ScreenName>().is_err());
        assert!("".parse::<ScreenName>().is_err());
    }

    #[test]
    fn test_id_from_str() {
        assert_eq!(
            "10765432100123456789".parse::<Id>().unwrap(),
            Id(10765432100123456789)
        );
        assert!("12ab".parse::<Id>().is_err());
    }
}
