use super::error::AuthError;
use super::models::{User, normalize_email};
use super::repository::{UserChange, UserRepository};
use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, abort};
use sled::{Db, IVec, Transactional, Tree};
use std::path::Path;

const USERS_TREE: &str = "users";
const USERS_BY_USERNAME_TREE: &str = "users_by_username";
const USERS_BY_EMAIL_TREE: &str = "users_by_email";

#[derive(Clone)]
pub struct SledUserRepository {
    db: Db,
}

impl SledUserRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, AuthError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn users_tree(&self) -> Result<Tree, AuthError> {
        Ok(self.db.open_tree(USERS_TREE)?)
    }

    fn username_tree(&self) -> Result<Tree, AuthError> {
        Ok(self.db.open_tree(USERS_BY_USERNAME_TREE)?)
    }

    fn email_tree(&self) -> Result<Tree, AuthError> {
        Ok(self.db.open_tree(USERS_BY_EMAIL_TREE)?)
    }

    fn load(&self, id: &[u8]) -> Result<Option<User>, AuthError> {
        match self.users_tree()?.get(id)? {
            Some(user_data) => Ok(Some(serde_json::from_slice(&user_data)?)),
            None => Ok(None),
        }
    }

    /// Resolve a secondary index entry to the user it points at
    fn load_via(&self, index: &Tree, key: &[u8]) -> Result<Option<User>, AuthError> {
        match index.get(key)? {
            Some(user_id) => self.load(&user_id),
            None => Ok(None),
        }
    }
}

/// True if an index entry points at a user other than `user_id`
fn taken_by_other(owner: Option<IVec>, user_id: &str) -> bool {
    owner.is_some_and(|owner| owner.as_ref() != user_id.as_bytes())
}

/// Turn a domain failure inside a transaction into an abort
fn aborting<T>(result: Result<T, AuthError>) -> ConflictableTransactionResult<T, AuthError> {
    result.map_err(ConflictableTransactionError::Abort)
}

#[async_trait]
impl UserRepository for SledUserRepository {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        let user_json = serde_json::to_vec(&user)?;
        let email_key = normalize_email(&user.email);
        let (users, usernames, emails) = (self.users_tree()?, self.username_tree()?, self.email_tree()?);

        (&users, &usernames, &emails).transaction(
            |(users, usernames, emails)| -> ConflictableTransactionResult<(), AuthError> {
                if usernames.get(user.username.as_bytes())?.is_some() {
                    return abort(AuthError::UserAlreadyExists);
                }
                if emails.get(email_key.as_bytes())?.is_some() {
                    return abort(AuthError::EmailAlreadyExists);
                }

                users.insert(user.id.as_bytes(), user_json.as_slice())?;
                usernames.insert(user.username.as_bytes(), user.id.as_bytes())?;
                emails.insert(email_key.as_bytes(), user.id.as_bytes())?;
                Ok(())
            },
        )?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        self.load(id.as_bytes())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        self.load_via(&self.username_tree()?, username.as_bytes())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        self.load_via(&self.email_tree()?, normalize_email(email).as_bytes())
    }

    async fn modify(&self, id: &str, change: &UserChange<'_>) -> Result<User, AuthError> {
        let (users, usernames, emails) = (self.users_tree()?, self.username_tree()?, self.email_tree()?);

        let user = (&users, &usernames, &emails).transaction(
            |(users, usernames, emails)| -> ConflictableTransactionResult<User, AuthError> {
                let Some(raw) = users.get(id.as_bytes())? else {
                    return abort(AuthError::UserNotFound);
                };
                let previous: User = aborting(serde_json::from_slice(&raw).map_err(AuthError::from))?;

                let mut user = previous.clone();
                if !aborting(change(&mut user))? {
                    return Ok(user);
                }
                user.touch();

                let email_key = normalize_email(&user.email);
                if taken_by_other(usernames.get(user.username.as_bytes())?, id) {
                    return abort(AuthError::UserAlreadyExists);
                }
                if taken_by_other(emails.get(email_key.as_bytes())?, id) {
                    return abort(AuthError::EmailAlreadyExists);
                }

                let user_json = aborting(serde_json::to_vec(&user).map_err(AuthError::from))?;
                users.insert(id.as_bytes(), user_json)?;

                // Re-point the indexes when the username or email changed
                if previous.username != user.username {
                    usernames.remove(previous.username.as_bytes())?;
                    usernames.insert(user.username.as_bytes(), id.as_bytes())?;
                }
                let previous_email = normalize_email(&previous.email);
                if previous_email != email_key {
                    emails.remove(previous_email.as_bytes())?;
                    emails.insert(email_key.as_bytes(), id.as_bytes())?;
                }

                Ok(user)
            },
        )?;

        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.username_tree()?.contains_key(username.as_bytes())?)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self
            .email_tree()?
            .contains_key(normalize_email(email).as_bytes())?)
    }
}
