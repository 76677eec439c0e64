use gitledger_types::{
    User, UserId,
    error::{AlreadyExistsSnafu, InvalidRequestSnafu, Result},
    messages::{CreateUser, DeleteUser, UpdateUser},
};
use tracing::{info, instrument};

use super::Ledger;
use crate::{entity::EntityStore, keys::LedgerKeys, names::AddressIndex};

impl Ledger {
    /// Registers a user for the creator's address.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for invalid fields and `AlreadyExists` if the
    /// address already has a user.
    #[instrument(skip(self, msg), fields(creator = %msg.creator))]
    pub fn create_user(&self, msg: CreateUser) -> Result<UserId> {
        msg.validate(&self.config.validation)?;
        let id = self.mutate("create_user", |txn, now| {
            if AddressIndex::user_id(&*txn, &msg.creator)?.is_some() {
                return AlreadyExistsSnafu { message: format!("user {} already exists", msg.creator) }
                    .fail();
            }
            let user = User {
                address: msg.creator.clone(),
                username: msg.username,
                bio: msg.bio,
                avatar_url: msg.avatar_url,
                created_at: now,
                updated_at: now,
                ..User::default()
            };
            let id = EntityStore::append(txn, user)?;
            AddressIndex::set(txn, &LedgerKeys::user_address_key(&msg.creator), id.value())?;
            Ok(id)
        })?;
        info!(user_id = id.value(), "user created");
        Ok(id)
    }

    /// Replaces the creator's profile fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for invalid fields and `NotFound` if the
    /// creator has no user.
    #[instrument(skip(self, msg), fields(creator = %msg.creator))]
    pub fn update_user(&self, msg: UpdateUser) -> Result<()> {
        msg.validate(&self.config.validation)?;
        self.mutate("update_user", |txn, now| {
            let mut user = AddressIndex::resolve_user(&*txn, &msg.creator)?;
            user.username = msg.username;
            user.bio = msg.bio;
            user.avatar_url = msg.avatar_url;
            user.updated_at = now;
            EntityStore::set(txn, &user)
        })?;
        info!("user updated");
        Ok(())
    }

    /// Deletes the creator's user record and its address index entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the creator has no user, and `InvalidRequest`
    /// while the user still owns repositories or belongs to organizations.
    #[instrument(skip(self, msg), fields(creator = %msg.creator))]
    pub fn delete_user(&self, msg: DeleteUser) -> Result<()> {
        self.mutate("delete_user", |txn, _| {
            let user = AddressIndex::resolve_user(&*txn, &msg.creator)?;
            if !user.repositories.is_empty() {
                return InvalidRequestSnafu {
                    message: format!(
                        "user {} still owns {} repositories",
                        msg.creator,
                        user.repositories.len()
                    ),
                }
                .fail();
            }
            if !user.organizations.is_empty() {
                return InvalidRequestSnafu {
                    message: format!("user {} still belongs to organizations", msg.creator),
                }
                .fail();
            }
            EntityStore::delete::<User>(txn, user.id)?;
            AddressIndex::remove(txn, &LedgerKeys::user_address_key(&msg.creator))?;
            Ok(())
        })?;
        info!("user deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use gitledger_types::{Address, ErrorCode};

    use super::*;
    use crate::ledger::tests::{ledger, register};

    #[test]
    fn test_create_user_assigns_dense_ids() {
        let ledger = ledger();
        let first = ledger
            .create_user(CreateUser::builder().creator("gitopia1a").username("a").build())
            .unwrap();
        let second = ledger
            .create_user(CreateUser::builder().creator("gitopia1b").username("b").build())
            .unwrap();
        assert_eq!((first.value(), second.value()), (0, 1));

        let user = ledger.user_by_address(&Address::new("gitopia1b")).unwrap();
        assert_eq!(user.id, second);
        assert_eq!(user.created_at, 1_000);
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let ledger = ledger();
        register(&ledger, "gitopia1a");
        let err = ledger
            .create_user(CreateUser::builder().creator("gitopia1a").username("again").build())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyExists);
    }

    #[test]
    fn test_update_user() {
        let ledger = ledger();
        let address = register(&ledger, "gitopia1a");
        ledger
            .update_user(
                UpdateUser::builder().creator("gitopia1a").username("renamed").bio("hi").build(),
            )
            .unwrap();
        let user = ledger.user_by_address(&address).unwrap();
        assert_eq!(user.username, "renamed");
        assert_eq!(user.bio, "hi");

        let err = ledger
            .update_user(UpdateUser::builder().creator("nobody").username("x").build())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_delete_user_clears_index() {
        let ledger = ledger();
        let address = register(&ledger, "gitopia1a");
        ledger.delete_user(DeleteUser::builder().creator("gitopia1a").build()).unwrap();
        assert_eq!(ledger.user_by_address(&address).unwrap_err().code(), ErrorCode::NotFound);

        // The address can register again and receives a fresh ID.
        let id = ledger
            .create_user(CreateUser::builder().creator("gitopia1a").username("a").build())
            .unwrap();
        assert_eq!(id.value(), 1);
    }
}
