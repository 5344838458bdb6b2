use crate::domain::repository::RoleRepository;
use crate::domain::types::Role;
use crate::error::CrmError;

pub struct ListRolesUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> ListRolesUseCase<R> {
    pub async fn execute(&self) -> Result<Vec<Role>, CrmError> {
        self.roles.list().await
    }
}
