use tracing::{debug, info, warn};

use crate::{
    fanout::FanoutDispatcher,
    gating::{Actor, PermissionPolicy, authorize},
    legacy::{GUILD_NOT_FOUND_REPLY, LegacyOutcome, LegacySend, USAGE_REPLY},
    link::LinkResolver,
    payload::{ForwardedContent, GuildMember, Recipient},
    platform::Platform,
};

/// The privileged relay commands.
///
/// Every operation runs the permission gate first and returns the reply text
/// for the invoker; nothing is sent when the gate denies.
#[derive(Debug, Clone)]
pub struct Relay {
    policy: PermissionPolicy,
    dispatcher: FanoutDispatcher,
}

impl Relay {
    pub fn new(policy: PermissionPolicy, dispatcher: FanoutDispatcher) -> Self {
        Self { policy, dispatcher }
    }

    pub fn policy(&self) -> &PermissionPolicy {
        &self.policy
    }

    pub fn dispatcher(&self) -> &FanoutDispatcher {
        &self.dispatcher
    }

    fn denial(&self, actor: &Actor, command: &'static str) -> Option<String> {
        let outcome = authorize(actor, &self.policy);
        let message = outcome.denial_message()?;
        info!(
            command,
            user_id = actor.user_id,
            channel_id = actor.channel_id,
            reason = %outcome,
            "command denied"
        );
        Some(message.to_string())
    }

    /// DM `message` to one user.
    pub async fn send_to_user(
        &self,
        actor: &Actor,
        user: &Recipient,
        message: &str,
        platform: Platform<'_>,
    ) -> String {
        if let Some(denied) = self.denial(actor, "send_to_user") {
            return denied;
        }

        let content = ForwardedContent::text(message);
        match self.dispatcher.deliver(&content, user, platform.sender).await {
            Ok(()) => format!("Message sent to {}", user.mention()),
            Err(e) => {
                warn!(recipient_id = user.id, error = %e, "send_to_user failed");
                format!("Failed to send message to {}", user.mention())
            },
        }
    }

    /// DM `message` to every current member of `role_id`.
    pub async fn send_to_role(
        &self,
        actor: &Actor,
        role_id: u64,
        message: &str,
        platform: Platform<'_>,
    ) -> String {
        if let Some(denied) = self.denial(actor, "send_to_role") {
            return denied;
        }

        let members = match platform.directory.role_members(role_id).await {
            Ok(members) => members,
            Err(e) => {
                warn!(role_id, error = %e, "failed to list role members");
                return role_listing_failed(role_id);
            },
        };

        self.dispatcher
            .dispatch(&ForwardedContent::text(message), &members, platform.sender)
            .await
            .summary("Sent")
    }

    /// Forward the message behind `link` to one user.
    pub async fn forward_to_user(
        &self,
        actor: &Actor,
        user: &Recipient,
        link: &str,
        platform: Platform<'_>,
    ) -> String {
        if let Some(denied) = self.denial(actor, "forward_to_user") {
            return denied;
        }

        let source = match LinkResolver::resolve(link, platform.store).await {
            Ok(source) => source,
            Err(e) => return e.reply().to_string(),
        };

        let content = ForwardedContent::from_source(&source);
        match self.dispatcher.deliver(&content, user, platform.sender).await {
            Ok(()) => format!("Successfully forwarded message to {}", user.mention()),
            Err(e) => {
                warn!(recipient_id = user.id, error = %e, "forward_to_user failed");
                format!("Failed to forward message to {}", user.mention())
            },
        }
    }

    /// Forward the message behind `link` to every current member of `role_id`.
    pub async fn forward_to_role(
        &self,
        actor: &Actor,
        role_id: u64,
        link: &str,
        platform: Platform<'_>,
    ) -> String {
        if let Some(denied) = self.denial(actor, "forward_to_role") {
            return denied;
        }

        let source = match LinkResolver::resolve(link, platform.store).await {
            Ok(source) => source,
            Err(e) => return e.reply().to_string(),
        };

        let members = match platform.directory.role_members(role_id).await {
            Ok(members) => members,
            Err(e) => {
                warn!(role_id, error = %e, "failed to list role members");
                return role_listing_failed(role_id);
            },
        };

        self.dispatcher
            .dispatch(&ForwardedContent::from_source(&source), &members, platform.sender)
            .await
            .summary("Forwarded")
    }

    /// The `send <names> "<message>"` text command. Names are matched
    /// against member usernames; unknown names are reported as given.
    pub async fn legacy_send(&self, actor: &Actor, args: &str, platform: Platform<'_>) -> String {
        if let Some(denied) = self.denial(actor, "send") {
            return denied;
        }

        let Some(request) = LegacySend::parse(args) else {
            return USAGE_REPLY.to_string();
        };

        let members = match platform.directory.members().await {
            Ok(members) => members,
            Err(e) => {
                warn!(error = %e, "failed to list guild members");
                return GUILD_NOT_FOUND_REPLY.to_string();
            },
        };

        let resolved: Vec<Option<Recipient>> = request
            .names
            .iter()
            .map(|name| {
                let member = members.iter().find(|m| m.name == *name);
                if member.is_none() {
                    debug!(name = %name, "no guild member with that name");
                }
                member.map(GuildMember::to_recipient)
            })
            .collect();
        let recipients: Vec<Recipient> = resolved.iter().flatten().cloned().collect();

        let mut delivered = self
            .dispatcher
            .dispatch_each(&ForwardedContent::text(request.message), &recipients, platform.sender)
            .await
            .into_iter();

        // Failures are reported in input order, unknown names included.
        let mut outcome = LegacyOutcome::default();
        for (name, target) in request.names.iter().zip(&resolved) {
            let sent = target.is_some() && matches!(delivered.next(), Some(Ok(())));
            if sent {
                outcome.sent += 1;
            } else {
                outcome.failed.push(name.clone());
            }
        }

        info!(
            requested = request.names.len(),
            sent = outcome.sent,
            failed = outcome.failed.len(),
            "legacy send finished"
        );
        outcome.reply()
    }
}

fn role_listing_failed(role_id: u64) -> String {
    format!("Failed to list members of <@&{role_id}>")
}
