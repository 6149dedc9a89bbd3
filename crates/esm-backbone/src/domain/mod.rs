pub(crate) mod identity;
pub(crate) mod invitation;
pub(crate) mod policy;
pub(crate) mod role;
pub(crate) mod session;
pub(crate) mod siteminder;
pub(crate) mod user;
