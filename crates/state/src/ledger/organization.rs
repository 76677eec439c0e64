use std::collections::BTreeMap;

use gitledger_store::KvRead;
use gitledger_types::{
    Address, MemberRole, Organization, OrganizationId,
    error::{AlreadyExistsSnafu, InvalidRequestSnafu, NotFoundSnafu, Result, UnauthorizedSnafu},
    messages::{
        CreateOrganization, DeleteOrganization, RemoveOrganizationMember, UpdateOrganization,
        UpdateOrganizationMember,
    },
    validation::validate_description,
};
use tracing::{info, instrument};

use super::Ledger;
use crate::{
    collections::{append_unique, remove_by_value},
    entity::EntityStore,
    names::{AddressIndex, WhoisIndex},
};

/// Loads organization `id` and checks that `requester` holds the `Owner` role.
fn owned_organization(
    txn: &impl KvRead,
    requester: &Address,
    id: OrganizationId,
) -> Result<Organization> {
    let organization: Organization = EntityStore::get(txn, id)?;
    if !organization.is_owner(requester) {
        return UnauthorizedSnafu {
            message: format!("{requester} is not an owner of organization {}", id.value()),
        }
        .fail();
    }
    Ok(organization)
}

impl Ledger {
    /// Creates an organization with the creator as its only `Owner`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for invalid fields, `NotFound` if the creator
    /// has no user, and `AlreadyExists` if the name is registered.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, name = %msg.name))]
    pub fn create_organization(&self, msg: CreateOrganization) -> Result<OrganizationId> {
        msg.validate(&self.config.validation)?;
        let id = self.mutate("create_organization", |txn, now| {
            let mut user = AddressIndex::resolve_user(&*txn, &msg.creator)?;
            if WhoisIndex::has(&*txn, &msg.name)? {
                return AlreadyExistsSnafu {
                    message: format!("organization {} already exists", msg.name),
                }
                .fail();
            }
            let organization = Organization {
                creator: msg.creator.clone(),
                name: msg.name.clone(),
                description: msg.description,
                members: BTreeMap::from([(msg.creator.clone(), MemberRole::Owner)]),
                created_at: now,
                updated_at: now,
                ..Organization::default()
            };
            let id = EntityStore::append(txn, organization)?;
            WhoisIndex::set(txn, &msg.name, id)?;
            append_unique(&mut user.organizations, id, "organization")?;
            user.updated_at = now;
            EntityStore::set(txn, &user)?;
            Ok(id)
        })?;
        info!(organization_id = id.value(), "organization created");
        Ok(id)
    }

    /// Replaces an organization's profile fields.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized` unless the creator is an `Owner`,
    /// or `InvalidRequest` for an oversized description.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, organization_id = msg.id.value()))]
    pub fn update_organization(&self, msg: UpdateOrganization) -> Result<()> {
        validate_description(&msg.description, &self.config.validation)?;
        self.mutate("update_organization", |txn, now| {
            let mut organization = owned_organization(&*txn, &msg.creator, msg.id)?;
            organization.description = msg.description;
            organization.avatar_url = msg.avatar_url;
            organization.location = msg.location;
            organization.website = msg.website;
            organization.updated_at = now;
            EntityStore::set(txn, &organization)
        })?;
        info!("organization updated");
        Ok(())
    }

    /// Adds a member or changes a member's role.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the organization or the member's user is missing,
    /// `Unauthorized` unless the creator is an `Owner`, and `InvalidRequest`
    /// if the change would leave no `Owner`.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, organization_id = msg.id.value(), member = %msg.member)
    )]
    pub fn update_organization_member(&self, msg: UpdateOrganizationMember) -> Result<()> {
        self.mutate("update_organization_member", |txn, now| {
            let mut organization = owned_organization(&*txn, &msg.creator, msg.id)?;
            let mut user = AddressIndex::resolve_user(&*txn, &msg.member)?;

            let previous = organization.members.get(&msg.member).copied();
            if previous == Some(MemberRole::Owner)
                && msg.role != MemberRole::Owner
                && organization.owner_count() == 1
            {
                return InvalidRequestSnafu {
                    message: format!("organization {} must keep an owner", msg.id.value()),
                }
                .fail();
            }

            if previous.is_none() {
                append_unique(&mut user.organizations, organization.id, "organization")?;
                user.updated_at = now;
                EntityStore::set(txn, &user)?;
            }
            organization.members.insert(msg.member.clone(), msg.role);
            organization.updated_at = now;
            EntityStore::set(txn, &organization)
        })?;
        info!(role = ?msg.role, "organization member updated");
        Ok(())
    }

    /// Removes a member.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the organization or membership is missing,
    /// `Unauthorized` unless the creator is an `Owner`, and `InvalidRequest`
    /// when removing the last `Owner`.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, organization_id = msg.id.value(), member = %msg.member)
    )]
    pub fn remove_organization_member(&self, msg: RemoveOrganizationMember) -> Result<()> {
        self.mutate("remove_organization_member", |txn, now| {
            let mut organization = owned_organization(&*txn, &msg.creator, msg.id)?;
            let Some(role) = organization.members.get(&msg.member).copied() else {
                return NotFoundSnafu {
                    message: format!(
                        "{} is not a member of organization {}",
                        msg.member,
                        msg.id.value()
                    ),
                }
                .fail();
            };
            if role == MemberRole::Owner && organization.owner_count() == 1 {
                return InvalidRequestSnafu {
                    message: format!("organization {} must keep an owner", msg.id.value()),
                }
                .fail();
            }
            let mut user = AddressIndex::resolve_user(&*txn, &msg.member)?;
            remove_by_value(&mut user.organizations, &organization.id, "organization")?;

            user.updated_at = now;
            EntityStore::set(txn, &user)?;
            organization.members.remove(&msg.member);
            organization.updated_at = now;
            EntityStore::set(txn, &organization)
        })?;
        info!("organization member removed");
        Ok(())
    }

    /// Deletes an organization that holds no repositories.
    ///
    /// The Whois entry and every member's back-reference go with it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized` unless the creator is an `Owner`,
    /// and `InvalidRequest` while the organization still owns repositories.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, organization_id = msg.id.value()))]
    pub fn delete_organization(&self, msg: DeleteOrganization) -> Result<()> {
        self.mutate("delete_organization", |txn, now| {
            let organization = owned_organization(&*txn, &msg.creator, msg.id)?;
            if !organization.repositories.is_empty() {
                return InvalidRequestSnafu {
                    message: format!(
                        "organization {} still owns {} repositories",
                        msg.id.value(),
                        organization.repositories.len()
                    ),
                }
                .fail();
            }

            let mut members = Vec::with_capacity(organization.members.len());
            for address in organization.members.keys() {
                let mut user = AddressIndex::resolve_user(&*txn, address)?;
                remove_by_value(&mut user.organizations, &organization.id, "organization")?;
                user.updated_at = now;
                members.push(user);
            }
            for user in &members {
                EntityStore::set(txn, user)?;
            }
            WhoisIndex::remove(txn, &organization.name)?;
            EntityStore::delete::<Organization>(txn, organization.id)?;
            Ok(())
        })?;
        info!("organization deleted");
        Ok(())
    }
}
