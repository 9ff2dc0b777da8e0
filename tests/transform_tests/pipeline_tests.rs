//! Pipeline Tests
//!
//! Tests for the compression and encryption stages and their ordering.

use bytes::Bytes;
use tagwire::transform::{compress, decompress, decrypt, SessionKey, TransformPipeline, NONCE_SIZE};
use tagwire::{ClientConfig, WireError};

fn sample_frame() -> Bytes {
    // Repetitive enough for zstd to shrink it
    Bytes::from("tagwire ".repeat(256))
}

// =============================================================================
// Stage Combination Tests
// =============================================================================

#[test]
fn test_identity_passes_through() {
    let pipeline = TransformPipeline::identity();
    let frame = sample_frame();

    let wire = pipeline.encode(frame.clone()).unwrap();
    assert_eq!(wire, frame);
    assert_eq!(pipeline.decode(wire).unwrap(), frame);
}

#[test]
fn test_compression_only() {
    let pipeline = TransformPipeline::new(Some(3), false);
    let frame = sample_frame();

    let wire = pipeline.encode(frame.clone()).unwrap();
    assert!(wire.len() < frame.len());
    assert_eq!(pipeline.decode(wire).unwrap(), frame);
}

#[test]
fn test_encryption_only() {
    let pipeline = TransformPipeline::new(None, true).with_session_key(SessionKey::generate());
    let frame = sample_frame();

    let wire = pipeline.encode(frame.clone()).unwrap();
    assert_ne!(&wire[NONCE_SIZE..], &frame[..]);
    assert_eq!(pipeline.decode(wire).unwrap(), frame);
}

#[test]
fn test_compression_and_encryption() {
    let key = SessionKey::generate();
    let sender = TransformPipeline::new(Some(5), true).with_session_key(key.clone());
    let receiver = TransformPipeline::new(Some(5), true).with_session_key(key);
    let frame = sample_frame();

    let wire = sender.encode(frame.clone()).unwrap();
    assert_eq!(receiver.decode(wire).unwrap(), frame);
}

#[test]
fn test_compress_happens_before_encrypt() {
    let key = SessionKey::generate();
    let pipeline = TransformPipeline::new(Some(3), true).with_session_key(key.clone());
    let frame = sample_frame();

    let wire = pipeline.encode(frame.clone()).unwrap();

    // Peeling the encryption layer leaves a zstd stream of the frame
    let inner = decrypt(&key, &wire).unwrap();
    assert_eq!(decompress(&inner, usize::MAX).unwrap(), frame.to_vec());
}

#[test]
fn test_empty_frame_survives_every_stage() {
    let pipeline = TransformPipeline::new(Some(1), true).with_session_key(SessionKey::generate());
    let wire = pipeline.encode(Bytes::new()).unwrap();
    assert!(pipeline.decode(wire).unwrap().is_empty());
}

// =============================================================================
// Key State Tests
// =============================================================================

#[test]
fn test_encrypt_without_key_fails() {
    let pipeline = TransformPipeline::new(None, true);

    assert!(matches!(
        pipeline.encode(sample_frame()),
        Err(WireError::EncryptionState(_))
    ));
    assert!(matches!(
        pipeline.decode(sample_frame()),
        Err(WireError::EncryptionState(_))
    ));
}

#[test]
fn test_key_installed_later() {
    let pipeline = TransformPipeline::new(None, true);
    assert!(!pipeline.has_session_key());

    pipeline.set_session_key(SessionKey::generate());
    assert!(pipeline.has_session_key());
    let wire = pipeline.encode(sample_frame()).unwrap();
    assert_eq!(pipeline.decode(wire).unwrap(), sample_frame());

    pipeline.clear_session_key();
    assert!(pipeline.encode(sample_frame()).is_err());
}

#[test]
fn test_from_config() {
    let key = SessionKey::generate();
    let config = ClientConfig::builder()
        .compression(true)
        .encryption(true)
        .session_key(key)
        .build();

    let pipeline = TransformPipeline::from_config(&config);
    assert!(pipeline.compression_enabled());
    assert!(pipeline.encryption_enabled());
    assert!(pipeline.has_session_key());

    let plain = TransformPipeline::from_config(&ClientConfig::default());
    assert!(!plain.compression_enabled());
    assert!(!plain.encryption_enabled());
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_tampered_ciphertext_rejected() {
    let pipeline = TransformPipeline::new(None, true).with_session_key(SessionKey::generate());
    let mut wire = pipeline.encode(sample_frame()).unwrap().to_vec();
    let last = wire.len() - 1;
    wire[last] ^= 0x01;

    assert!(matches!(
        pipeline.decode(Bytes::from(wire)),
        Err(WireError::Encryption(_))
    ));
}

#[test]
fn test_wrong_key_rejected() {
    let sender = TransformPipeline::new(None, true).with_session_key(SessionKey::generate());
    let receiver = TransformPipeline::new(None, true).with_session_key(SessionKey::generate());

    let wire = sender.encode(sample_frame()).unwrap();
    assert!(matches!(receiver.decode(wire), Err(WireError::Encryption(_))));
}

#[test]
fn test_short_envelope_rejected() {
    let key = SessionKey::generate();
    assert!(matches!(decrypt(&key, &[0u8; 10]), Err(WireError::Encryption(_))));
}

#[test]
fn test_garbage_is_not_zstd() {
    let pipeline = TransformPipeline::new(Some(3), false);
    assert!(matches!(
        pipeline.decode(Bytes::from_static(b"not a zstd frame")),
        Err(WireError::Compression(_))
    ));
}

#[test]
fn test_decompress_limit() {
    let data = vec![0u8; 64 * 1024];
    let compressed = compress(&data, 3).unwrap();

    assert!(decompress(&compressed, 1024).is_err());
    assert_eq!(decompress(&compressed, data.len()).unwrap().len(), data.len());
}
