pub mod data_source_alerts;
pub mod data_source_system;
pub mod data_source_systems;
pub mod data_source_user;
pub mod data_source_user_group;
pub mod data_source_users;
pub mod query;

pub use data_source_alerts::AlertsDataSource;
pub use data_source_system::SystemDataSource;
pub use data_source_systems::SystemsDataSource;
pub use data_source_user::UserDataSource;
pub use data_source_user_group::UserGroupDataSource;
pub use data_source_users::UsersDataSource;
