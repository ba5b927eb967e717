//! Length-prefixed image framing

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Size of the big-endian length prefix
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Payload buffer reserved up front; larger images grow it as bytes arrive
const INITIAL_PAYLOAD_CAPACITY: usize = 64 * 1024;

/// Framing failures
///
/// Every variant ends the session without a response and without an audit
/// record.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("connection closed before the 4-byte length prefix arrived")]
    ShortLength,

    #[error("declared payload is empty")]
    Empty,

    #[error("declared payload of {declared} bytes exceeds the {max}-byte limit")]
    Oversized { declared: u32, max: u32 },

    #[error("connection closed after {received} of {expected} payload bytes")]
    ShortPayload { expected: u32, received: usize },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully received image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    data: Vec<u8>,
}

impl ImageUpload {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Read and check the length prefix
///
/// The declared size is validated before any payload buffer exists, so a
/// hostile prefix cannot force a large allocation.
pub async fn read_length<R>(reader: &mut R, max_payload: u32) -> Result<u32, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    reader.read_exact(&mut prefix).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::ShortLength
        } else {
            FrameError::Io(e)
        }
    })?;

    let declared = u32::from_be_bytes(prefix);
    if declared == 0 {
        return Err(FrameError::Empty);
    }
    if declared > max_payload {
        return Err(FrameError::Oversized {
            declared,
            max: max_payload,
        });
    }

    Ok(declared)
}

/// Read exactly `len` payload bytes
pub async fn read_payload<R>(reader: &mut R, len: u32) -> Result<ImageUpload, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut data = Vec::with_capacity(initial_capacity(len));
    reader.take(u64::from(len)).read_to_end(&mut data).await?;

    if data.len() != len as usize {
        return Err(FrameError::ShortPayload {
            expected: len,
            received: data.len(),
        });
    }

    Ok(ImageUpload::new(data))
}

fn initial_capacity(declared: u32) -> usize {
    usize::try_from(declared)
        .unwrap_or(usize::MAX)
        .min(INITIAL_PAYLOAD_CAPACITY)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = (payload.len() as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    async fn read_image<R>(reader: &mut R, max_payload: u32) -> Result<ImageUpload, FrameError>
    where
        R: AsyncRead + Unpin,
    {
        let len = read_length(reader, max_payload).await?;
        read_payload(reader, len).await
    }

    #[tokio::test]
    async fn test_reads_exact_payload() {
        let bytes = frame(b"\xff\xd8jpeg-bytes\xff\xd9");
        let mut reader = bytes.as_slice();

        let image = read_image(&mut reader, 1024).await.unwrap();
        assert_eq!(image.as_bytes(), b"\xff\xd8jpeg-bytes\xff\xd9");
        assert!(reader.is_empty());
    }

    #[tokio::test]
    async fn test_trailing_bytes_are_not_consumed() {
        let mut bytes = frame(b"abc");
        bytes.extend_from_slice(b"extra");
        let mut reader = bytes.as_slice();

        let image = read_image(&mut reader, 1024).await.unwrap();
        assert_eq!(image.as_bytes(), b"abc");
        assert_eq!(reader, b"extra");
    }

    #[tokio::test]
    async fn test_length_is_big_endian() {
        let mut reader: &[u8] = &[0x00, 0x00, 0x01, 0x02];
        assert_eq!(read_length(&mut reader, u32::MAX).await.unwrap(), 258);
    }

    #[tokio::test]
    async fn test_short_length_prefix() {
        let mut reader: &[u8] = &[0x00, 0x01];
        let err = read_image(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, FrameError::ShortLength));

        let mut reader: &[u8] = &[];
        let err = read_image(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, FrameError::ShortLength));
    }

    #[tokio::test]
    async fn test_zero_length_rejected() {
        let mut reader: &[u8] = &[0, 0, 0, 0];
        let err = read_image(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, FrameError::Empty));
    }

    #[tokio::test]
    async fn test_oversized_rejected_before_payload() {
        // Only the prefix is present; the check must not wait for payload bytes.
        let mut reader: &[u8] = &u32::MAX.to_be_bytes();
        let err = read_image(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(
            err,
            FrameError::Oversized {
                declared: u32::MAX,
                max: 1024
            }
        ));
    }

    #[tokio::test]
    async fn test_limit_is_inclusive() {
        let bytes = frame(&[7u8; 16]);
        let mut reader = bytes.as_slice();
        assert_eq!(read_image(&mut reader, 16).await.unwrap().as_bytes().len(), 16);
    }

    #[tokio::test]
    async fn test_short_payload() {
        let mut bytes = 10u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"four");
        let mut reader = bytes.as_slice();

        let err = read_image(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(
            err,
            FrameError::ShortPayload {
                expected: 10,
                received: 4
            }
        ));
    }

    #[test]
    fn test_declared_length_does_not_size_the_buffer() {
        assert_eq!(initial_capacity(3), 3);
        assert_eq!(initial_capacity(16 * 1024 * 1024), INITIAL_PAYLOAD_CAPACITY);
        assert_eq!(initial_capacity(u32::MAX), INITIAL_PAYLOAD_CAPACITY);
    }

    #[tokio::test]
    async fn test_stalled_large_upload_reports_bytes_received() {
        let declared: u32 = 16 * 1024 * 1024;
        let mut bytes = declared.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[1u8; 100]);
        let mut reader = bytes.as_slice();

        let err = read_image(&mut reader, declared).await.unwrap_err();
        assert!(matches!(
            err,
            FrameError::ShortPayload {
                expected,
                received: 100
            } if expected == declared
        ));
    }

    #[tokio::test]
    async fn test_payload_split_across_writes() {
        let (mut client, mut server) = tokio::io::duplex(8);
        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            let bytes = frame(&[42u8; 100]);
            for chunk in bytes.chunks(7) {
                client.write_all(chunk).await.unwrap();
            }
        });

        let image = read_image(&mut server, 1024).await.unwrap();
        writer.await.unwrap();
        assert_eq!(image.as_bytes(), &[42u8; 100][..]);
    }
}
