pub mod invitation;
pub mod user;
