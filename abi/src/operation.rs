//! Operation-ID decoding.

use tonidx_types::Message;

use crate::AbiError;

/// Operation ID of a plain text transfer comment.
pub const TEXT_COMMENT_OP: u32 = 0;

const OP_LEN: usize = 4;

pub trait OperationDecoder {
    /// Decode the operation tag of `msg.body` into `msg.operation_id` and,
    /// for text comments, `msg.transfer_comment`.
    fn parse_operation_id(&self, msg: &mut Message) -> Result<(), AbiError>;
}

/// Reads the big-endian `u32` at the head of the body.
///
/// Bodies shorter than four bytes carry no operation. Operation 0 followed by
/// further bytes is a text comment; a tail that is not UTF-8 leaves the
/// comment empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperationIdDecoder;

impl OperationDecoder for OperationIdDecoder {
    fn parse_operation_id(&self, msg: &mut Message) -> Result<(), AbiError> {
        msg.operation_id = None;
        msg.transfer_comment = None;

        let Some((op, rest)) = split_op(&msg.body) else {
            return Ok(());
        };
        msg.operation_id = Some(op);

        if op == TEXT_COMMENT_OP && !rest.is_empty() {
            match std::str::from_utf8(rest) {
                Ok(text) => msg.transfer_comment = Some(text.to_owned()),
                Err(e) => tracing::debug!(
                    msg_hash = %msg.body_hash,
                    error = %e,
                    "text comment is not valid UTF-8"
                ),
            }
        }
        Ok(())
    }
}

pub(crate) fn split_op(body: &[u8]) -> Option<(u32, &[u8])> {
    if body.len() < OP_LEN {
        return None;
    }
    let (head, rest) = body.split_at(OP_LEN);
    let op = u32::from_be_bytes(head.try_into().ok()?);
    Some((op, rest))
}
