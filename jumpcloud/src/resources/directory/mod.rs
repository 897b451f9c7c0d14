pub mod resource_group_membership;
pub mod resource_system;
pub mod resource_system_group;
pub mod resource_user;
pub mod resource_user_group;

pub use resource_group_membership::GroupMembershipResource;
pub use resource_system::SystemResource;
pub use resource_system_group::SystemGroupResource;
pub use resource_user::UserResource;
pub use resource_user_group::UserGroupResource;
