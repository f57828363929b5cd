//! Text completion port.

use waypoint_types::conversation::Message;
use waypoint_types::error::LlmError;

/// Opaque `complete(system_prompt, history) -> text` capability.
///
/// Implementations decide how roles map onto their wire format; the engine
/// only ever passes the conversation log in chronological order.
pub trait TextCompletion: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        history: &[Message],
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}
