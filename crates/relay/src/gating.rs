/// Who invoked a privileged command, captured at invocation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: u64,
    pub channel_id: u64,
    /// Role ids the invoker holds in the guild.
    pub roles: Vec<u64>,
}

impl Actor {
    pub fn new(user_id: u64, channel_id: u64, roles: Vec<u64>) -> Self {
        Self {
            user_id,
            channel_id,
            roles,
        }
    }

    /// An invoker that could not be resolved to a guild member. Holds no
    /// roles, so it never passes the gate.
    pub fn unresolved(user_id: u64, channel_id: u64) -> Self {
        Self::new(user_id, channel_id, Vec::new())
    }
}

/// Where privileged commands may be used and by whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPolicy {
    pub allowed_channel_id: u64,
    pub allowed_role_id: u64,
}

impl PermissionPolicy {
    pub fn new(allowed_channel_id: u64, allowed_role_id: u64) -> Self {
        Self {
            allowed_channel_id,
            allowed_role_id,
        }
    }
}

/// Outcome of the permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzResult {
    Allowed,
    DeniedWrongChannel,
    DeniedNoRole,
}

impl AuthzResult {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }

    /// Text shown to a denied invoker; `None` when allowed.
    pub fn denial_message(self) -> Option<&'static str> {
        match self {
            Self::Allowed => None,
            Self::DeniedWrongChannel => {
                Some("This command can only be used in the designated channel.")
            },
            Self::DeniedNoRole => Some("You do not have permission to use this command."),
        }
    }
}

impl std::fmt::Display for AuthzResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allowed => write!(f, "allowed"),
            Self::DeniedWrongChannel => write!(f, "wrong channel"),
            Self::DeniedNoRole => write!(f, "missing required role"),
        }
    }
}

/// Decide whether `actor` may invoke a privileged command.
///
/// Fails closed: both the channel and the role must match. The channel is
/// checked first.
pub fn authorize(actor: &Actor, policy: &PermissionPolicy) -> AuthzResult {
    if actor.channel_id != policy.allowed_channel_id {
        return AuthzResult::DeniedWrongChannel;
    }
    if !actor.roles.contains(&policy.allowed_role_id) {
        return AuthzResult::DeniedNoRole;
    }
    AuthzResult::Allowed
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    const CHANNEL: u64 = 1_000;
    const ROLE: u64 = 2_000;

    fn policy() -> PermissionPolicy {
        PermissionPolicy::new(CHANNEL, ROLE)
    }

    #[rstest]
    #[case(CHANNEL, vec![ROLE], AuthzResult::Allowed)]
    #[case(CHANNEL, vec![7], AuthzResult::DeniedNoRole)]
    #[case(1_001, vec![ROLE], AuthzResult::DeniedWrongChannel)]
    #[case(1_001, vec![7], AuthzResult::DeniedWrongChannel)]
    fn channel_and_role_matrix(
        #[case] channel_id: u64,
        #[case] roles: Vec<u64>,
        #[case] expected: AuthzResult,
    ) {
        let actor = Actor::new(42, channel_id, roles);
        assert_eq!(authorize(&actor, &policy()), expected);
        assert_eq!(authorize(&actor, &policy()).is_allowed(), expected == AuthzResult::Allowed);
    }

    #[test]
    fn role_among_many_is_found() {
        let actor = Actor::new(42, CHANNEL, vec![5, 6, ROLE, 8]);
        assert!(authorize(&actor, &policy()).is_allowed());
    }

    #[test]
    fn unresolved_actor_is_denied() {
        let actor = Actor::unresolved(42, CHANNEL);
        assert_eq!(authorize(&actor, &policy()), AuthzResult::DeniedNoRole);
    }

    #[test]
    fn denial_messages() {
        assert_eq!(AuthzResult::Allowed.denial_message(), None);
        assert_eq!(
            AuthzResult::DeniedWrongChannel.denial_message(),
            Some("This command can only be used in the designated channel.")
        );
        assert_eq!(
            AuthzResult::DeniedNoRole.denial_message(),
            Some("You do not have permission to use this command.")
        );
    }
}
