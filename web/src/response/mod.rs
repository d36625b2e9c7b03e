//! Response bodies that are not plain entity models.

pub(crate) mod queue;
pub(crate) mod time;
pub(crate) mod user_session;
