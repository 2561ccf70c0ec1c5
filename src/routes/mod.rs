pub mod auth_route;
pub mod invitation_route;
