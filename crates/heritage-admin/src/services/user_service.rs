use crate::model::{User, UserId, UserUpdate};
use resource_framework::{
    FilterSet, FilterValue, ResourceClient, ResourceController, Result, Role,
};
use std::sync::Arc;
use tracing::instrument;

pub const ROLE_PARAM: &str = "role";

/// Console account management. Users are not moderated.
pub struct UserService<C: ResourceClient<User>> {
    controller: ResourceController<User, C>,
}

impl<C: ResourceClient<User>> Clone for UserService<C> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
        }
    }
}

impl<C: ResourceClient<User> + 'static> UserService<C> {
    pub fn new(controller: ResourceController<User, C>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &ResourceController<User, C> {
        &self.controller
    }

    #[instrument(skip(self))]
    pub async fn fetch_by_role(&self, role: Role) -> Result<Arc<Vec<User>>> {
        let scope = FilterSet::new().with(ROLE_PARAM, FilterValue::scalar(role.as_str()));
        self.controller.update_filters(scope);
        self.controller.refresh().await
    }

    #[instrument(skip(self))]
    pub async fn change_role(&self, id: UserId, role: Role) -> bool {
        let update = UserUpdate {
            role: Some(role),
            ..Default::default()
        };
        self.controller.update(&id, update).await
    }
}
