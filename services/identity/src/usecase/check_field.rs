use crate::domain::repository::AccountRepository;
use crate::domain::types::FieldAvailability;
use crate::error::IdentityError;

pub struct CheckFieldInput {
    pub email: String,
}

/// Reports whether an email is free. This endpoint deliberately reveals account
/// existence.
pub struct CheckFieldUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> CheckFieldUseCase<A> {
    pub async fn execute(&self, input: CheckFieldInput) -> Result<FieldAvailability, IdentityError> {
        let exists = self.accounts.exists_with_email(&input.email).await?;
        Ok(FieldAvailability { available: !exists })
    }
}
