//! Users: students and instructors

use super::{find, insert, require, save};
use crate::entities::{add_to_set, new_id, Profile, Role, User};
use crate::error::Result;
use crate::query::filter::Filter;
use crate::Database;
use chrono::{Duration, Utc};

const AVATAR_COLOURS: [&str; 3] = ["E6E6FA", "C1E1C1", "F0F8FF"];

/// Fields supplied when registering a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub skills: Vec<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            ..Default::default()
        }
    }

    pub fn named(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn skills<S: Into<String>>(mut self, skills: impl IntoIterator<Item = S>) -> Self {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }
}

/// Placeholder avatar showing the user's initials
fn placeholder_avatar(new: &NewUser) -> String {
    let initial = |s: &Option<String>| s.as_deref().and_then(|s| s.chars().next());
    let initials: String = [initial(&new.first_name), initial(&new.last_name)]
        .into_iter()
        .flatten()
        .collect();
    let colour = AVATAR_COLOURS[new.username.len() % AVATAR_COLOURS.len()];
    format!("https://placehold.co/100x100/{}/000000?text={}", colour, initials)
}

/// Register a user with the given role.
///
/// A taken email fails with `Conflict`.
pub async fn create(db: &Database, role: Role, new: NewUser) -> Result<User> {
    let now = Utc::now();
    let avatar = new.avatar.clone().unwrap_or_else(|| placeholder_avatar(&new));
    let user = User {
        id: new_id(),
        username: new.username,
        email: new.email,
        password_hash: new.password_hash,
        role,
        first_name: new.first_name,
        last_name: new.last_name,
        profile: Profile {
            bio: new.bio,
            avatar: Some(avatar),
            skills: new.skills,
        },
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    insert(db, &user).await?;
    Ok(user)
}

pub async fn add_student(db: &Database, new: NewUser) -> Result<User> {
    create(db, Role::Student, new).await
}

pub async fn add_instructor(db: &Database, new: NewUser) -> Result<User> {
    create(db, Role::Instructor, new).await
}

pub async fn get(db: &Database, id: &str) -> Result<Option<User>> {
    super::load(db, id).await
}

pub async fn active_students(db: &Database) -> Result<Vec<User>> {
    let filter = Filter::eq("role", Role::Student).and(Filter::eq("is_active", true));
    find(db, &filter).await
}

/// Users created within the last `months` months, counted as 30 days each
pub async fn joined_last_months(db: &Database, months: u32) -> Result<Vec<User>> {
    let since = Utc::now() - Duration::days(i64::from(months) * 30);
    find(db, &Filter::gte("created_at", since)).await
}

/// Partial profile change; unset fields are left alone
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub avatar: Option<String>,
    /// Merged into the existing skills without duplicates
    pub skills_to_add: Vec<String>,
    pub is_active: Option<bool>,
}

pub async fn update_profile(db: &Database, id: &str, update: ProfileUpdate) -> Result<User> {
    let mut user: User = require(db, id).await?;

    if let Some(bio) = update.bio {
        user.profile.bio = Some(bio);
    }
    if let Some(avatar) = update.avatar {
        user.profile.avatar = Some(avatar);
    }
    add_to_set(&mut user.profile.skills, update.skills_to_add);
    if let Some(active) = update.is_active {
        user.is_active = active;
    }
    user.updated_at = Utc::now();

    save(db, &user, "Update profile of").await?;
    Ok(user)
}

/// Deactivate a user, keeping the record
pub async fn soft_delete(db: &Database, id: &str) -> Result<User> {
    let mut user: User = require(db, id).await?;
    user.is_active = false;
    user.updated_at = Utc::now();
    save(db, &user, "Deactivate").await?;
    Ok(user)
}

/// Look a user up by email address
pub async fn by_email(db: &Database, email: &str) -> Result<Option<User>> {
    Ok(find(db, &Filter::eq("email", email)).await?.into_iter().next())
}
