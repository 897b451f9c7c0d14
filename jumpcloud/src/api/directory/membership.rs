//! Group membership API (v2 `/api/v2/{usergroups|systemgroups}/{id}/members`)

use crate::api::common::{ListOptions, ObjectRef, PagedResponse};
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

const PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    User,
    System,
}

impl GroupKind {
    fn collection(&self) -> &'static str {
        match self {
            GroupKind::User => "usergroups",
            GroupKind::System => "systemgroups",
        }
    }

    /// Member object type in the request body
    pub fn member_type(&self) -> &'static str {
        match self {
            GroupKind::User => "user",
            GroupKind::System => "system",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MembershipOp {
    Add,
    Remove,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MembershipRequest {
    pub op: MembershipOp,
    #[serde(rename = "type")]
    pub member_type: String,
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupMember {
    pub to: ObjectRef,
}

pub struct MembershipApi<'a> {
    client: &'a Client,
    kind: GroupKind,
}

impl<'a> MembershipApi<'a> {
    pub fn new(client: &'a Client, kind: GroupKind) -> Self {
        Self { client, kind }
    }

    fn members_path(&self, group_id: &str) -> String {
        format!(
            "/api/v2/{}/{}/members",
            self.kind.collection(),
            urlencoding::encode(group_id)
        )
    }

    async fn modify(&self, group_id: &str, member_id: &str, op: MembershipOp) -> Result<(), ApiError> {
        let request = MembershipRequest {
            op,
            member_type: self.kind.member_type().to_string(),
            id: member_id.to_string(),
        };
        self.client
            .post::<serde_json::Value, _>(&self.members_path(group_id), &request)
            .await
            .map(|_| ())
    }

    /// POST /api/v2/{groups}/{id}/members with op=add
    pub async fn add(&self, group_id: &str, member_id: &str) -> Result<(), ApiError> {
        self.modify(group_id, member_id, MembershipOp::Add).await
    }

    /// POST /api/v2/{groups}/{id}/members with op=remove
    pub async fn remove(&self, group_id: &str, member_id: &str) -> Result<(), ApiError> {
        self.modify(group_id, member_id, MembershipOp::Remove).await
    }

    /// GET /api/v2/{groups}/{id}/members, one page
    pub async fn list(
        &self,
        group_id: &str,
        options: &ListOptions,
    ) -> Result<PagedResponse<GroupMember>, ApiError> {
        self.client
            .get_page(&self.members_path(group_id), options)
            .await
    }

    /// Whether `member_id` is a direct member, paging through the group
    pub async fn contains(&self, group_id: &str, member_id: &str) -> Result<bool, ApiError> {
        let mut skip = 0;
        loop {
            let options = ListOptions::default().with_limit(PAGE_SIZE).with_skip(skip);
            let members = self.list(group_id, &options).await?.into_results();
            if members.iter().any(|m| m.to.id == member_id) {
                return Ok(true);
            }
            if members.len() < PAGE_SIZE as usize {
                return Ok(false);
            }
            skip += PAGE_SIZE;
        }
    }
}
