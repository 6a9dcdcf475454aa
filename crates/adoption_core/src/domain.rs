//! crates/adoption_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry serde derives because the key-value store persists them
//! as JSON, but they are independent of any concrete store or transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A registered user profile - used throughout the app.
///
/// `favorites` is a set so the "no duplicate ids" invariant holds by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub adoptions: u32,
    #[serde(default)]
    pub favorites: BTreeSet<String>,
}

impl User {
    /// Builds a fresh profile with no adoptions and no favorites.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        cpf: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            cpf,
            phone: String::new(),
            address: String::new(),
            bio: String::new(),
            avatar: None,
            created_at,
            adoptions: 0,
            favorites: BTreeSet::new(),
        }
    }

    pub fn is_favorite(&self, animal_id: &str) -> bool {
        self.favorites.contains(animal_id)
    }

    /// Shallow field overwrite. Collection fields present in the patch replace
    /// the current value wholesale.
    pub fn apply(&mut self, patch: UserPatch) {
        let UserPatch {
            name,
            email,
            cpf,
            phone,
            address,
            bio,
            avatar,
            adoptions,
            favorites,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(cpf) = cpf {
            self.cpf = Some(cpf);
        }
        if let Some(phone) = phone {
            self.phone = phone;
        }
        if let Some(address) = address {
            self.address = address;
        }
        if let Some(bio) = bio {
            self.bio = bio;
        }
        if let Some(avatar) = avatar {
            self.avatar = Some(avatar);
        }
        if let Some(adoptions) = adoptions {
            self.adoptions = adoptions;
        }
        if let Some(favorites) = favorites {
            self.favorites = favorites;
        }
    }
}

/// Partial profile update. `id` and `created_at` are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub adoptions: Option<u32>,
    pub favorites: Option<BTreeSet<String>>,
}

impl UserPatch {
    pub fn bio(bio: impl Into<String>) -> Self {
        Self {
            bio: Some(bio.into()),
            ..Self::default()
        }
    }

    pub fn favorites(favorites: BTreeSet<String>) -> Self {
        Self {
            favorites: Some(favorites),
            ..Self::default()
        }
    }
}

/// The role a person signs up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Adotante,
    Ong,
}

//=========================================================================================
// Conversation transcript
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    System,
    User,
}

/// A single entry of the intake conversation. Entries are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.sender == Sender::System
    }
}

//=========================================================================================
// Animals
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Cat,
    Dog,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

/// An animal listed for adoption by an ONG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub id: String,
    pub name: String,
    pub species: Species,
    #[serde(default)]
    pub breed: String,
    pub age_months: u32,
    pub size: AnimalSize,
    pub sex: Sex,
    #[serde(default)]
    pub description: String,
    pub ong_id: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub adopted: bool,
}

//=========================================================================================
// Remote auth payloads
//=========================================================================================

/// The user summary the remote API returns alongside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// `{token, user}` as returned by `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSnapshot {
    pub token: String,
    pub user: RemoteUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> User {
        User::new("u1", "Ana", "ana@x.com", None, Utc::now())
    }

    #[test]
    fn apply_overwrites_only_present_fields() {
        let mut user = ana();
        user.phone = "11999998888".into();
        user.apply(UserPatch::bio("hi"));
        assert_eq!(user.bio, "hi");
        assert_eq!(user.phone, "11999998888");
        assert_eq!(user.name, "Ana");
    }

    #[test]
    fn favorites_are_replaced_wholesale() {
        let mut user = ana();
        user.favorites.insert("a1".into());
        user.favorites.insert("a2".into());
        user.apply(UserPatch::favorites(BTreeSet::from(["a3".to_string()])));
        assert_eq!(user.favorites, BTreeSet::from(["a3".to_string()]));
    }

    #[test]
    fn user_serializes_camel_case() {
        let json = serde_json::to_value(ana()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["favorites"], serde_json::json!([]));
    }

    #[test]
    fn user_tolerates_missing_optional_fields() {
        let user: User = serde_json::from_str(
            r#"{"id":"1","name":"Bia","email":"bia@x.com","createdAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(user.adoptions, 0);
        assert!(user.favorites.is_empty());
    }
}
