pub(super) mod authentication;
pub(super) mod document;
pub(super) mod invitation;
