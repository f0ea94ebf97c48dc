/// Mode dispatcher
///
/// Maps the active mode or a secondary action to one service request,
/// runs it, and routes the output back into the session.

pub mod flow;
pub mod prompts;
pub mod request;
pub mod slot;

pub use flow::{execute_with_progress, PendingJob, ServiceOutput};
pub use request::GenerationAction;
pub(crate) use request::Target;
pub use slot::Ticket;
