pub mod auth_const {
    pub const USER_TABLE: &str = "users";
    pub const AUTH_PASSWORD_TABLE: &str = "auth_passwords";
    pub const INVITATION_TABLE: &str = "invitations";
    pub const JWT_ISSUER: &str = "invitations";
}

pub mod invitation_const {
    /// Length of a generated invitation key.
    pub const KEY_LENGTH: usize = 64;
    pub const EMAIL_INVITE_TEMPLATE: &str = "invitations/email/email_invite";
    pub const ACCEPT_INVITE_PATH: &str = "/invitations/accept-invite";
    pub const SESSION_COOKIE: &str = "sessionid";
}
