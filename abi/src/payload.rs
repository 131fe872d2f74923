//! Payload decoding boundary.

use tonidx_types::{AccountState, Message, MessagePayload};

use crate::PayloadError;

pub trait PayloadParser {
    /// Decode the body of `msg` sent from `src` to `dst`.
    ///
    /// Returns [`PayloadError::NotAvailable`] when nothing describes the
    /// message; callers skip it.
    fn parse_message_payload(
        &self,
        src: &AccountState,
        dst: &AccountState,
        msg: &Message,
    ) -> Result<MessagePayload, PayloadError>;
}
