use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

// User document stored in the `users` collection
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: String, // PRIMARY IDENTIFIER, carried in the token `sub`
    pub username: String,
    pub email: String,
    pub password: String, // bcrypt hash
    #[serde(default)]
    pub profile_picture: Option<String>,
    pub created_at: BsonDateTime,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            _id: None,
            user_id: ObjectId::new().to_hex(),
            username,
            email,
            password: password_hash,
            profile_picture: None,
            created_at: BsonDateTime::now(),
        }
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub created_at: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            profile_picture: user.profile_picture.clone(),
            created_at: user.created_at.try_to_rfc3339_string().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_view_omits_password() {
        let user = User::new("alice".into(), "alice@binus.ac.id".into(), "$2b$04$hash".into());
        let json = serde_json::to_value(UserInfo::from(&user)).unwrap();

        assert_eq!(json["id"], user.user_id.as_str());
        assert_eq!(json["username"], "alice");
        assert!(json["profilePicture"].is_null());
        assert!(json["createdAt"].is_string());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn new_users_get_distinct_ids() {
        let a = User::new("a".into(), "a@x.io".into(), "h".into());
        let b = User::new("b".into(), "b@x.io".into(), "h".into());
        assert_ne!(a.user_id, b.user_id);
        assert_eq!(a.user_id.len(), 24);
    }
}
