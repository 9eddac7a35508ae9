pub mod check_field;
pub mod events;
pub mod group;
pub mod login;
pub mod password;
pub mod profile;
pub mod refresh;
pub mod saga;
pub mod signup;
pub mod token;

use passage_domain::permission::Permission;
use tracing::warn;

use crate::domain::repository::Transaction;
use crate::error::IdentityError;

/// Commit on success, roll back on failure. A failed rollback is logged and the
/// original error is returned.
pub(crate) async fn finish<T, O>(tx: T, result: Result<O, IdentityError>) -> Result<O, IdentityError>
where
    T: Transaction,
{
    match result {
        Ok(out) => {
            tx.commit().await?;
            Ok(out)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "transaction rollback failed");
            }
            Err(e)
        }
    }
}

pub(crate) fn scope_strings(permissions: &[Permission]) -> Vec<String> {
    permissions.iter().map(|p| p.as_str().to_owned()).collect()
}
