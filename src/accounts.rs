use tracing::info;

use crate::config::BootstrapAdmin;
use crate::db::UserStore;
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{NewUser, Role, User};

/// Create a user unless the email is taken. Shared by self-registration,
/// admin-create and the startup admin seed.
pub async fn create_account(
    store: &dyn UserStore,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    // Checked before hashing so duplicates fail fast; the store's unique
    // constraint still decides races.
    if store.find_by_email(&normalize_email(email)).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let new_user = NewUser::new(email, password, role)?;
    let user = store.insert(new_user).await?;
    Ok(user)
}

/// Make sure the configured admin account exists. An existing user with the
/// same email is left as is, whatever its role.
pub async fn ensure_bootstrap_admin(
    store: &dyn UserStore,
    admin: &BootstrapAdmin,
) -> Result<(), AppError> {
    match create_account(store, &admin.email, &admin.password, Role::Admin).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "bootstrap admin created");
            Ok(())
        }
        Err(AppError::Conflict(_)) => {
            info!(email = %admin.email, "bootstrap admin already present");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
