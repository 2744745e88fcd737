//! Students and instructors

use super::{set_opt, strings_of, Entity, Fields, Role};
use crate::error::Result;
use crate::schema::catalog::USERS;
use crate::storage::document::{Document, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub skills: Vec<String>,
}

impl Profile {
    fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        if let Some(bio) = &self.bio {
            map.insert("bio".to_string(), Value::from(bio));
        }
        if let Some(avatar) = &self.avatar {
            map.insert("avatar".to_string(), Value::from(avatar));
        }
        map.insert("skills".to_string(), Value::from(self.skills.clone()));
        Value::Object(map)
    }

    fn from_value(value: Option<&Value>) -> Self {
        let Some(obj) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        Self {
            bio: obj.get("bio").and_then(Value::as_str).map(str::to_string),
            avatar: obj.get("avatar").and_then(Value::as_str).map(str::to_string),
            skills: strings_of(obj.get("skills")).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile: Profile,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    /// "First Last", skipping missing parts
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Entity for User {
    const COLLECTION: &'static str = USERS;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new(&self.id);
        doc.set("username", &self.username)
            .set("email", &self.email)
            .set("password_hash", &self.password_hash)
            .set("role", self.role)
            .set("profile", self.profile.to_value())
            .set("is_active", self.is_active)
            .set("created_at", self.created_at)
            .set("updated_at", self.updated_at);
        set_opt(&mut doc, "first_name", self.first_name.clone());
        set_opt(&mut doc, "last_name", self.last_name.clone());
        doc
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let f = Fields::of(doc, USERS);
        Ok(Self {
            id: doc.id.clone(),
            username: f.string("username")?,
            email: f.string("email")?,
            password_hash: f.string("password_hash")?,
            role: f.parsed("role")?,
            first_name: f.opt_string("first_name")?,
            last_name: f.opt_string("last_name")?,
            profile: Profile::from_value(f.value("profile")),
            is_active: f.bool_or("is_active", true)?,
            created_at: f.datetime("created_at")?,
            updated_at: f.datetime("updated_at")?,
        })
    }
}
