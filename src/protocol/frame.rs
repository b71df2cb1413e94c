//! Message framing over the byte stream.
//!
//! One frame carries one sealed message as three length-prefixed fields, in
//! order: nonce, tag, ciphertext. Every length is a little-endian u32; both
//! peers use little-endian regardless of host byte order.
//!
//! ```text
//! [len(nonce)][nonce][len(tag)][tag][len(ciphertext)][ciphertext]
//! ```
//!
//! Declared lengths are validated before allocation: the nonce and tag
//! lengths are fixed by the cipher, and the ciphertext is capped so a
//! malicious peer cannot force an unbounded allocation.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::crypto::aead::{SealedMessage, NONCE_LEN, TAG_LEN};
use crate::error::ChatError;

/// Upper bound on a frame's ciphertext field. Chat messages are single
/// lines of text; anything near this size is hostile or corrupt.
pub const MAX_CIPHERTEXT_LEN: usize = 64 * 1024;

/// Serializes one sealed message into a wire frame.
pub fn encode(sealed: &SealedMessage) -> Vec<u8> {
    let mut frame = Vec::with_capacity(3 * 4 + NONCE_LEN + TAG_LEN + sealed.ciphertext.len());

    frame.extend_from_slice(&(sealed.nonce.len() as u32).to_le_bytes());
    frame.extend_from_slice(&sealed.nonce);
    frame.extend_from_slice(&(sealed.tag.len() as u32).to_le_bytes());
    frame.extend_from_slice(&sealed.tag);
    frame.extend_from_slice(&(sealed.ciphertext.len() as u32).to_le_bytes());
    frame.extend_from_slice(&sealed.ciphertext);

    frame
}

/// Reads one frame from the stream.
///
/// Suspends until every declared byte has arrived; never returns a short
/// record. If the stream ends first — mid-frame or at a frame boundary —
/// the result is [`ChatError::TruncatedStream`], the signal that the peer
/// disconnected.
pub async fn decode<R: AsyncRead + Unpin>(reader: &mut R) -> Result<SealedMessage, ChatError> {
    let nonce_len = read_len(reader).await?;
    if nonce_len != NONCE_LEN {
        return Err(ChatError::MalformedFrame(format!(
            "nonce length {} (expected {})",
            nonce_len, NONCE_LEN
        )));
    }
    let mut nonce = [0u8; NONCE_LEN];
    read_field(reader, &mut nonce).await?;

    let tag_len = read_len(reader).await?;
    if tag_len != TAG_LEN {
        return Err(ChatError::MalformedFrame(format!(
            "tag length {} (expected {})",
            tag_len, TAG_LEN
        )));
    }
    let mut tag = [0u8; TAG_LEN];
    read_field(reader, &mut tag).await?;

    let ciphertext_len = read_len(reader).await?;
    if ciphertext_len > MAX_CIPHERTEXT_LEN {
        return Err(ChatError::FrameTooLarge {
            len: ciphertext_len,
            max: MAX_CIPHERTEXT_LEN,
        });
    }
    let mut ciphertext = vec![0u8; ciphertext_len];
    read_field(reader, &mut ciphertext).await?;

    Ok(SealedMessage {
        nonce,
        tag,
        ciphertext,
    })
}

async fn read_len<R: AsyncRead + Unpin>(reader: &mut R) -> Result<usize, ChatError> {
    let mut len_bytes = [0u8; 4];
    read_field(reader, &mut len_bytes).await?;
    Ok(u32::from_le_bytes(len_bytes) as usize)
}

async fn read_field<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), ChatError> {
    reader.read_exact(buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ChatError::TruncatedStream
        } else {
            ChatError::Io(e)
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ciphertext: Vec<u8>) -> SealedMessage {
        SealedMessage {
            nonce: [7u8; NONCE_LEN],
            tag: [9u8; TAG_LEN],
            ciphertext,
        }
    }

    #[tokio::test]
    async fn test_encode_decode_roundtrip() {
        let sealed = sample(vec![1, 2, 3, 4, 5]);
        let frame = encode(&sealed);

        let mut stream: &[u8] = &frame;
        let decoded = decode(&mut stream).await.unwrap();

        assert_eq!(decoded, sealed);
        assert!(stream.is_empty());
    }

    #[tokio::test]
    async fn test_empty_ciphertext_roundtrip() {
        let sealed = sample(Vec::new());
        let frame = encode(&sealed);

        let mut stream: &[u8] = &frame;
        let decoded = decode(&mut stream).await.unwrap();

        assert_eq!(decoded, sealed);
    }

    #[tokio::test]
    async fn test_two_frames_back_to_back() {
        let first = sample(vec![1, 2, 3]);
        let second = sample(vec![4, 5]);

        let mut bytes = encode(&first);
        bytes.extend_from_slice(&encode(&second));

        let mut stream: &[u8] = &bytes;
        assert_eq!(decode(&mut stream).await.unwrap(), first);
        assert_eq!(decode(&mut stream).await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_clean_close_is_truncation() {
        let mut stream: &[u8] = &[];
        assert!(matches!(
            decode(&mut stream).await,
            Err(ChatError::TruncatedStream)
        ));
    }

    #[tokio::test]
    async fn test_truncated_mid_field() {
        let sealed = sample(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let frame = encode(&sealed);

        // Cut the frame short after the ciphertext length is declared.
        let cut = frame.len() - 4;
        let mut stream: &[u8] = &frame[..cut];

        assert!(matches!(
            decode(&mut stream).await,
            Err(ChatError::TruncatedStream)
        ));
    }

    #[tokio::test]
    async fn test_truncated_mid_length_prefix() {
        let frame = encode(&sample(vec![1]));
        let mut stream: &[u8] = &frame[..2];

        assert!(matches!(
            decode(&mut stream).await,
            Err(ChatError::TruncatedStream)
        ));
    }

    #[tokio::test]
    async fn test_wrong_nonce_length_rejected() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&16u32.to_le_bytes());
        frame.extend_from_slice(&[0u8; 16]);

        let mut stream: &[u8] = &frame;
        assert!(matches!(
            decode(&mut stream).await,
            Err(ChatError::MalformedFrame(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_ciphertext_rejected() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&(NONCE_LEN as u32).to_le_bytes());
        frame.extend_from_slice(&[0u8; NONCE_LEN]);
        frame.extend_from_slice(&(TAG_LEN as u32).to_le_bytes());
        frame.extend_from_slice(&[0u8; TAG_LEN]);
        // Adversarial length field; no bytes follow, and none should be read.
        frame.extend_from_slice(&u32::MAX.to_le_bytes());

        let mut stream: &[u8] = &frame;
        assert!(matches!(
            decode(&mut stream).await,
            Err(ChatError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_lengths_are_little_endian() {
        let frame = encode(&sample(vec![0xAB]));

        assert_eq!(&frame[..4], &[12, 0, 0, 0]);
        let tag_len_at = 4 + NONCE_LEN;
        assert_eq!(&frame[tag_len_at..tag_len_at + 4], &[16, 0, 0, 0]);
    }
}
