//! Process-wide RSA test keys.
//!
//! Generating RSA keys is expensive, so each test binary generates three
//! 1024-bit keys once and shares them.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use rand::rngs::OsRng;
use rsa::RsaPrivateKey;

use crate::keys::{ReceiverKeys, SenderKeys};

const TEST_KEY_BITS: usize = 1024;

static SENDER: LazyLock<RsaPrivateKey> = LazyLock::new(generate);
static RECEIVER: LazyLock<RsaPrivateKey> = LazyLock::new(generate);
static STRANGER: LazyLock<RsaPrivateKey> = LazyLock::new(generate);

fn generate() -> RsaPrivateKey {
    RsaPrivateKey::new(&mut OsRng, TEST_KEY_BITS).expect("generate RSA test key")
}

/// The sender's signing key.
pub fn sender_private_key() -> &'static RsaPrivateKey {
    &SENDER
}

/// The receiver's decryption key.
pub fn receiver_private_key() -> &'static RsaPrivateKey {
    &RECEIVER
}

/// A key that belongs to neither party.
pub fn stranger_private_key() -> &'static RsaPrivateKey {
    &STRANGER
}

/// Sender-side key set: sender private key + receiver public key.
pub fn sender_keys() -> SenderKeys {
    SenderKeys::new(SENDER.clone(), RECEIVER.to_public_key())
}

/// Receiver-side key set: receiver private key + sender public key.
pub fn receiver_keys() -> ReceiverKeys {
    ReceiverKeys::new(RECEIVER.clone(), SENDER.to_public_key())
}
