use std::fmt::Display;

use casbin::{CoreApi, DefaultModel, Enforcer, MemoryAdapter, MgmtApi};

pub(crate) const DOCUMENT_RESOURCE: &str = "document";

/// Role assumed by requests without a session.
pub(crate) const GUEST_ROLE: &str = "guest";

const ADMIN_ROLE: &str = "admin";
const USER_ROLE: &str = "user";

/// Roles are the subjects of every rule, a request is allowed when one rule matches exactly.
const ROLE_MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CrudAction {
    Create,
    Read,
    Update,
    Delete,
}

impl CrudAction {
    pub const ALL: [CrudAction; 4] = [CrudAction::Create, CrudAction::Read, CrudAction::Update, CrudAction::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrudAction::Create => "create",
            CrudAction::Read => "read",
            CrudAction::Update => "update",
            CrudAction::Delete => "delete",
        }
    }
}

impl Display for CrudAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn rule(role: &str, resource: &str, action: CrudAction) -> Vec<String> {
    vec![role.to_owned(), resource.to_owned(), action.as_str().to_owned()]
}

/// Registers the CRUD permission set of `resource`: admins get every action, users may read.
pub(crate) async fn set_crud_permissions(enforcer: &mut Enforcer, resource: &str) -> casbin::Result<()> {
    let mut rules: Vec<Vec<String>> =
        CrudAction::ALL.iter().map(|action| rule(ADMIN_ROLE, resource, *action)).collect();
    rules.push(rule(USER_ROLE, resource, CrudAction::Read));

    enforcer.add_policies(rules).await?;

    Ok(())
}

pub(crate) struct DocumentPolicy {
    enforcer: Enforcer,
}

impl DocumentPolicy {
    pub async fn new() -> casbin::Result<Self> {
        let model = DefaultModel::from_str(ROLE_MODEL).await?;
        let mut enforcer = Enforcer::new(model, MemoryAdapter::default()).await?;
        set_crud_permissions(&mut enforcer, DOCUMENT_RESOURCE).await?;

        Ok(Self { enforcer })
    }

    /// True when any of `roles` may perform `action` on `resource`.
    pub fn is_allowed<S: AsRef<str>>(&self, roles: &[S], resource: &str, action: CrudAction) -> casbin::Result<bool> {
        for role in roles {
            let role: &str = role.as_ref();
            if self.enforcer.enforce((role, resource, action.as_str()))? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
