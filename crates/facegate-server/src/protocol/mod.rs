//! Wire protocol
//!
//! Request: a 4-byte big-endian length `N` followed by exactly `N` bytes of
//! image data. One request per connection.
//!
//! Response: `<STATUS>;<LABEL>` as ASCII text with no length prefix and no
//! trailing newline. Closing the connection marks the end of the message.

pub mod framing;

pub use framing::{FrameError, ImageUpload, LENGTH_PREFIX_LEN};

use crate::decision::AccessDecision;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Render the response line for a decision
pub fn encode_response(decision: &AccessDecision) -> String {
    format!("{};{}", decision.status.as_str(), decision.label)
}

/// Write the decision and shut down the write half
pub async fn write_response<W>(writer: &mut W, decision: &AccessDecision) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(encode_response(decision).as_bytes()).await?;
    writer.flush().await?;
    writer.shutdown().await
}
