//! Invitation email templates.

use serde::Serialize;

use super::MailError;
use crate::consts::invitation_const::EMAIL_INVITE_TEMPLATE;

/// Values available to the invitation templates.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InviteContext {
    pub invite_url: String,
    pub site_name: String,
    pub email: String,
    pub key: String,
    pub inviter: Option<String>,
}

#[derive(Debug)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl EmailContent {
    /// Renders the template registered under `template`.
    pub fn render(template: &str, ctx: &InviteContext) -> Result<Self, MailError> {
        match template {
            EMAIL_INVITE_TEMPLATE => Ok(Self::invite(ctx)),
            other => Err(MailError::UnknownTemplate(other.to_string())),
        }
    }

    fn invite(ctx: &InviteContext) -> Self {
        Self {
            subject: format!("Invitation to join {}", ctx.site_name),
            text: Self::invite_text(ctx),
            html: Self::invite_html(ctx),
        }
    }

    fn invite_text(ctx: &InviteContext) -> String {
        let invited_by = match &ctx.inviter {
            Some(inviter) => format!(" by {}", inviter),
            None => String::new(),
        };
        format!(
            r#"Hello,

You ({email}) have been invited{invited_by} to join {site}.

To accept the invitation, go to {url}

--
{site}"#,
            email = ctx.email,
            invited_by = invited_by,
            site = ctx.site_name,
            url = ctx.invite_url,
        )
    }

    fn invite_html(ctx: &InviteContext) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body>
    <p>Hello,</p>
    <p>You ({email}) have been invited to join {site}.</p>
    <p><a href="{url}">Accept the invitation</a></p>
    <p>{site}</p>
</body>
</html>"#,
            email = ctx.email,
            site = ctx.site_name,
            url = ctx.invite_url,
        )
    }
}
