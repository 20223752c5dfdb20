//! Length-Prefixed Frames
//!
//! One envelope or acknowledgement per frame:
//!
//! ```text
//! +----------------+------------------+
//! | length (4 LE)  | rkyv payload     |
//! +----------------+------------------+
//! ```
//!
//! Payloads are validated with `check_archived_root` before use.

use rkyv::ser::serializers::AllocSerializer;
use rkyv::validation::validators::DefaultValidator;
use rkyv::{AlignedVec, Archive, CheckBytes, Deserialize, Infallible, Serialize};
use std::io::ErrorKind;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted payload (16 MiB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Frame codec failures
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode message: {0}")]
    Encode(String),

    #[error("Failed to decode message: {0}")]
    Decode(String),

    #[error("Frame of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[error("Empty frame")]
    Empty,

    #[error("Peer closed the stream")]
    Closed,
}

fn check_len(len: usize) -> Result<usize, FrameError> {
    match len {
        0 => Err(FrameError::Empty),
        n if n > MAX_FRAME_SIZE => Err(FrameError::TooLarge {
            size: n,
            max: MAX_FRAME_SIZE,
        }),
        n => Ok(n),
    }
}

/// Encode `message` and write it as one frame
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize<AllocSerializer<256>>,
{
    let payload =
        rkyv::to_bytes::<_, 256>(message).map_err(|e| FrameError::Encode(e.to_string()))?;
    let len = check_len(payload.len())?;

    let mut frame = Vec::with_capacity(4 + len);
    frame.extend_from_slice(&(len as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame and decode it as `T`.
///
/// A stream that ends before the length prefix yields [`FrameError::Closed`].
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, FrameError>
where
    R: AsyncRead + Unpin,
    T: Archive,
    T::Archived: for<'a> CheckBytes<DefaultValidator<'a>> + Deserialize<T, Infallible>,
{
    let len = match reader.read_u32_le().await {
        Ok(len) => check_len(len as usize)?,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(FrameError::Closed),
        Err(e) => return Err(e.into()),
    };

    // Validation needs an aligned buffer.
    let mut payload = AlignedVec::with_capacity(len);
    payload.resize(len, 0);
    reader.read_exact(&mut payload).await?;

    let archived = rkyv::check_archived_root::<T>(&payload)
        .map_err(|e| FrameError::Decode(e.to_string()))?;
    archived
        .deserialize(&mut Infallible)
        .map_err(|_| FrameError::Decode("archived value could not be rebuilt".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Command, Envelope, LoadRequest, MonitoringReport};

    #[tokio::test]
    async fn test_envelope_over_duplex() {
        let (mut client, mut server) = tokio::io::duplex(64 * 1024);
        let original = Envelope::new(
            "benchmark.1",
            "benchmark.0",
            Command::RequestedMonitoring(MonitoringReport {
                time: vec![1.25],
                cpu_stats: vec![10.0, 20.0],
                mem_stats: vec![1024.0],
                event_loop_lags: vec![0.0, 0.5],
            }),
        );

        write_frame(&mut client, &original).await.unwrap();
        let decoded: Envelope = read_frame(&mut server).await.unwrap();
        assert_eq!(original, decoded);
    }

    #[tokio::test]
    async fn test_multiple_frames_in_order() {
        let (mut client, mut server) = tokio::io::duplex(64 * 1024);
        let commands = vec![
            Command::StartMeasuring,
            Command::States(LoadRequest::set(100)),
            Command::StopMeasuring,
        ];
        for cmd in &commands {
            let env = Envelope::new("benchmark.0", "benchmark.1", cmd.clone());
            write_frame(&mut client, &env).await.unwrap();
        }
        for expected in &commands {
            let env: Envelope = read_frame(&mut server).await.unwrap();
            assert_eq!(&env.command, expected);
        }
    }

    #[tokio::test]
    async fn test_end_of_stream() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        let result: Result<Envelope, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(FrameError::Closed)));
    }

    #[tokio::test]
    async fn test_zero_length_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&0u32.to_le_bytes()).await.unwrap();
        let result: Result<Envelope, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(FrameError::Empty)));
    }

    #[tokio::test]
    async fn test_oversize_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let len = (MAX_FRAME_SIZE + 1) as u32;
        client.write_all(&len.to_le_bytes()).await.unwrap();
        let result: Result<Envelope, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(FrameError::TooLarge { .. })));
    }
}
