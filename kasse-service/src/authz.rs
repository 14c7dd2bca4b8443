//! Authorization policy.
//!
//! One pure decision function consulted before every handler body runs, so a
//! denial can never leave a partial mutation behind. The rules are a flat
//! table over (actor, action, resource, owner), not a permission-class
//! hierarchy.

use anyhow::anyhow;
use kasse_core::error::AppError;

/// The authenticated principal resolved by the token middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub is_staff: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    AddBalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account,
    Profile,
    BeverageType,
    Purchase,
}

/// Profile fields only staff may write, checked against the raw payload's
/// key set. Present-but-unchanged values are still rejected.
pub const PROTECTED_PROFILE_FIELDS: [&str; 2] = ["is_freeloader", "balance"];

/// Returns true if a non-staff actor's profile payload touches a
/// staff-only field.
pub fn touches_protected_fields(payload: &serde_json::Value) -> bool {
    payload
        .as_object()
        .map(|map| PROTECTED_PROFILE_FIELDS.iter().any(|f| map.contains_key(*f)))
        .unwrap_or(false)
}

/// Decide whether `actor` may perform `action` on `resource`.
///
/// `owner` is the id of the account owning the target resource (the target
/// account itself for `Resource::Account`, the purchase's account for
/// `Resource::Purchase`). For creations, `owner` is the account the new
/// resource will belong to.
pub fn decide(
    actor: Option<&Actor>,
    action: Action,
    resource: Resource,
    owner: Option<i64>,
) -> Result<(), AppError> {
    // Self-registration is the single anonymous operation.
    if resource == Resource::Account && action == Action::Create {
        return Ok(());
    }

    let actor = actor.ok_or_else(|| AppError::Unauthorized(anyhow!("Authentication required")))?;

    if actor.is_staff {
        // Staff may do anything except operations disabled for everyone.
        return match (resource, action) {
            (Resource::Profile, Action::Create) | (Resource::Profile, Action::Delete) => Err(
                AppError::Forbidden(anyhow!("Profiles are managed through accounts")),
            ),
            _ => Ok(()),
        };
    }

    let is_owner = owner.is_some_and(|id| id == actor.id);

    match (resource, action) {
        (_, Action::Read) => Ok(()),

        (Resource::BeverageType, _) => Err(AppError::Forbidden(anyhow!(
            "Beverage catalog writes require staff"
        ))),

        (Resource::Purchase, Action::Create) if is_owner => Ok(()),
        (Resource::Purchase, Action::Create) => Err(AppError::Forbidden(anyhow!(
            "Cannot set user different from authenticated user unless staff"
        ))),
        (Resource::Purchase, _) => Err(AppError::Forbidden(anyhow!(
            "Purchase updates require staff"
        ))),

        (Resource::Account, Action::Update) | (Resource::Account, Action::Delete)
            if is_owner =>
        {
            Ok(())
        }
        (Resource::Account, _) => Err(AppError::Forbidden(anyhow!(
            "Account writes require the owner or staff"
        ))),

        (Resource::Profile, Action::Update) if is_owner => Ok(()),
        (Resource::Profile, Action::AddBalance) => Err(AppError::Forbidden(anyhow!(
            "Balance adjustments require staff"
        ))),
        (Resource::Profile, _) => Err(AppError::Forbidden(anyhow!(
            "Profile writes require the owner or staff"
        ))),
    }
}
