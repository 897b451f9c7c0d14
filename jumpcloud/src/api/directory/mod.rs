pub mod membership;
pub mod system_groups;
pub mod systems;
pub mod user_groups;
pub mod users;

use crate::api::Client;

/// Directory API: users, systems and the groups that collect them
pub struct DirectoryApi<'a> {
    client: &'a Client,
}

impl<'a> DirectoryApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn users(&self) -> users::UsersApi<'a> {
        users::UsersApi::new(self.client)
    }

    pub fn user_groups(&self) -> user_groups::UserGroupsApi<'a> {
        user_groups::UserGroupsApi::new(self.client)
    }

    pub fn system_groups(&self) -> system_groups::SystemGroupsApi<'a> {
        system_groups::SystemGroupsApi::new(self.client)
    }

    pub fn systems(&self) -> systems::SystemsApi<'a> {
        systems::SystemsApi::new(self.client)
    }

    pub fn membership(&self, kind: membership::GroupKind) -> membership::MembershipApi<'a> {
        membership::MembershipApi::new(self.client, kind)
    }
}
