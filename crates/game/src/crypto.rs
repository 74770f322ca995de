//! Session security: the XOR-masked handshake, per-message AEAD sealing with
//! frame-id IV masking, and Ed25519 chat signatures.
//!
//! The handshake carries a client-random 32-byte session key and a fixed
//! 32-byte magic signature, both XOR-masked with the shared master secret.
//! Chat payloads are encrypted per recipient under that recipient's session
//! key; before transmission the first 8 IV bytes are XORed with the
//! little-endian frame id, which travels in the packet so the receiver can
//! undo the mask.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use chacha20poly1305::ChaCha20Poly1305;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use thiserror::Error;

pub const MASTER_KEY_ENV: &str = "TREK_SUB_KEY";
pub const SESSION_KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const HANDSHAKE_BODY_LEN: usize = 64;

/// Fixed 32-byte constant both sides know; proves the client holds the
/// master secret without sending it.
pub const HANDSHAKE_MAGIC: &[u8; 32] = b"TREK-ULTRA-KEY-VERIFICATION-SIG\0";

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("handshake body too short: {0} bytes")]
    Truncated(usize),
    #[error("magic signature mismatch, wrong master key")]
    BadMagic,
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("cipher {0:?} is not available in this build")]
    Unsupported(CipherAlgo),
    #[error("AEAD failure (bad key, IV or tag)")]
    Aead,
    #[error("plaintext too large: {0} bytes")]
    Oversize(usize),
}

/// Wire tags for the session cipher table. Tags 3..=11 are recognized for
/// interop but this build only seals with the AEAD entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CipherAlgo {
    #[default]
    None = 0,
    Aes256Gcm = 1,
    ChaCha20Poly1305 = 2,
    Aria256Gcm = 3,
    Camellia256Ctr = 4,
    SeedCbc = 5,
    Cast5Cbc = 6,
    IdeaCbc = 7,
    TripleDesCbc = 8,
    BlowfishCbc = 9,
    Rc4 = 10,
    DesCbc = 11,
    /// PQC marker; seals with AES-256-GCM under the hood.
    Pqc = 12,
}

impl CipherAlgo {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Aes256Gcm,
            2 => Self::ChaCha20Poly1305,
            3 => Self::Aria256Gcm,
            4 => Self::Camellia256Ctr,
            5 => Self::SeedCbc,
            6 => Self::Cast5Cbc,
            7 => Self::IdeaCbc,
            8 => Self::TripleDesCbc,
            9 => Self::BlowfishCbc,
            10 => Self::Rc4,
            11 => Self::DesCbc,
            12 => Self::Pqc,
            _ => Self::None,
        }
    }

    /// Parse the operator-facing name used by the `enc` command.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "off" | "none" => Self::None,
            "aes" => Self::Aes256Gcm,
            "chacha" => Self::ChaCha20Poly1305,
            "aria" => Self::Aria256Gcm,
            "camellia" => Self::Camellia256Ctr,
            "seed" => Self::SeedCbc,
            "cast" | "cast5" => Self::Cast5Cbc,
            "idea" => Self::IdeaCbc,
            "3des" => Self::TripleDesCbc,
            "bf" | "blowfish" => Self::BlowfishCbc,
            "rc4" => Self::Rc4,
            "des" => Self::DesCbc,
            "pqc" => Self::Pqc,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Aes256Gcm => "AES-256-GCM",
            Self::ChaCha20Poly1305 => "ChaCha20-Poly1305",
            Self::Aria256Gcm => "ARIA-256-GCM",
            Self::Camellia256Ctr => "Camellia-256-CTR",
            Self::SeedCbc => "SEED-CBC",
            Self::Cast5Cbc => "CAST5-CBC",
            Self::IdeaCbc => "IDEA-CBC",
            Self::TripleDesCbc => "3DES-CBC",
            Self::BlowfishCbc => "Blowfish-CBC",
            Self::Rc4 => "RC4",
            Self::DesCbc => "DES-CBC",
            Self::Pqc => "PQC (AES-256-GCM)",
        }
    }

    /// Whether this build can actually seal/open with the algorithm.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Self::None | Self::Aes256Gcm | Self::ChaCha20Poly1305 | Self::Pqc
        )
    }
}

/// Normalize the `TREK_SUB_KEY` value: zero-pad short keys, truncate long.
pub fn master_key_from_env(value: &str) -> [u8; SESSION_KEY_LEN] {
    let mut key = [0u8; SESSION_KEY_LEN];
    let bytes = value.as_bytes();
    let n = bytes.len().min(SESSION_KEY_LEN);
    key[..n].copy_from_slice(&bytes[..n]);
    key
}

/// Build the 64-byte handshake body a client sends: session key then magic,
/// both XOR-masked with the master secret.
pub fn encode_hello(session_key: &[u8; SESSION_KEY_LEN], master: &[u8; SESSION_KEY_LEN]) -> [u8; HANDSHAKE_BODY_LEN] {
    let mut body = [0u8; HANDSHAKE_BODY_LEN];
    for k in 0..SESSION_KEY_LEN {
        body[k] = session_key[k] ^ master[k];
        body[SESSION_KEY_LEN + k] = HANDSHAKE_MAGIC[k] ^ master[k];
    }
    body
}

/// Server side: unmask the body, check the magic, return the session key.
pub fn decode_hello(body: &[u8], master: &[u8; SESSION_KEY_LEN]) -> Result<[u8; SESSION_KEY_LEN], HandshakeError> {
    if body.len() < HANDSHAKE_BODY_LEN {
        return Err(HandshakeError::Truncated(body.len()));
    }
    let mut sig = [0u8; SESSION_KEY_LEN];
    for k in 0..SESSION_KEY_LEN {
        sig[k] = body[SESSION_KEY_LEN + k] ^ master[k];
    }
    if &sig != HANDSHAKE_MAGIC {
        return Err(HandshakeError::BadMagic);
    }
    let mut key = [0u8; SESSION_KEY_LEN];
    for k in 0..SESSION_KEY_LEN {
        key[k] = body[k] ^ master[k];
    }
    Ok(key)
}

/// An encrypted chat payload ready for the message packet: the IV is already
/// masked with the frame id.
#[derive(Debug, Clone)]
pub struct SealedPayload {
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

fn mask_iv(iv: &mut [u8; IV_LEN], frame_id: i64) {
    let frame = frame_id.to_le_bytes();
    for (b, f) in iv.iter_mut().zip(frame.iter()) {
        *b ^= f;
    }
}

fn aead_seal(algo: CipherAlgo, key: &[u8; SESSION_KEY_LEN], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let payload = Payload {
        msg: plaintext,
        aad: &[],
    };
    match algo {
        CipherAlgo::Aes256Gcm | CipherAlgo::Pqc => Aes256Gcm::new(key.into())
            .encrypt(Nonce::from_slice(iv), payload)
            .map_err(|_| CryptoError::Aead),
        CipherAlgo::ChaCha20Poly1305 => ChaCha20Poly1305::new(key.into())
            .encrypt(Nonce::from_slice(iv), payload)
            .map_err(|_| CryptoError::Aead),
        other => Err(CryptoError::Unsupported(other)),
    }
}

fn aead_open(algo: CipherAlgo, key: &[u8; SESSION_KEY_LEN], iv: &[u8; IV_LEN], joined: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let payload = Payload {
        msg: joined,
        aad: &[],
    };
    match algo {
        CipherAlgo::Aes256Gcm | CipherAlgo::Pqc => Aes256Gcm::new(key.into())
            .decrypt(Nonce::from_slice(iv), payload)
            .map_err(|_| CryptoError::Aead),
        CipherAlgo::ChaCha20Poly1305 => ChaCha20Poly1305::new(key.into())
            .decrypt(Nonce::from_slice(iv), payload)
            .map_err(|_| CryptoError::Aead),
        other => Err(CryptoError::Unsupported(other)),
    }
}

/// Encrypt a chat payload under a session key, detaching the auth tag and
/// masking the IV with the frame id.
pub fn seal_message(
    algo: CipherAlgo,
    key: &[u8; SESSION_KEY_LEN],
    frame_id: i64,
    plaintext: &[u8],
) -> Result<SealedPayload, CryptoError> {
    if plaintext.len() > 65535 {
        return Err(CryptoError::Oversize(plaintext.len()));
    }
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let mut joined = aead_seal(algo, key, &iv, plaintext)?;
    // AEAD output is ciphertext || 16-byte tag; the wire carries them apart.
    let split = joined.len() - TAG_LEN;
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&joined[split..]);
    joined.truncate(split);

    mask_iv(&mut iv, frame_id);
    Ok(SealedPayload {
        iv,
        tag,
        ciphertext: joined,
    })
}

/// Reverse of [`seal_message`]: unmask the IV with the embedded frame id,
/// reattach the tag, decrypt.
pub fn open_message(
    algo: CipherAlgo,
    key: &[u8; SESSION_KEY_LEN],
    frame_id: i64,
    masked_iv: &[u8; IV_LEN],
    tag: &[u8; TAG_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let mut iv = *masked_iv;
    mask_iv(&mut iv, frame_id);
    let mut joined = ciphertext.to_vec();
    joined.extend_from_slice(tag);
    aead_open(algo, key, &iv, &joined)
}

/// Sign a chat plaintext with the server (or a client) identity key.
pub fn sign_text(key: &SigningKey, text: &[u8]) -> [u8; 64] {
    key.sign(text).to_bytes()
}

/// Verify a detached chat signature against a raw 32-byte public key.
pub fn verify_text(pubkey: &[u8; 32], signature: &[u8; 64], text: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(pubkey) else {
        return false;
    };
    let sig = Signature::from_bytes(signature);
    key.verify_strict(text, &sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> ([u8; 32], [u8; 32]) {
        let mut session = [0u8; 32];
        let mut master = [0u8; 32];
        for i in 0..32 {
            session[i] = (i * 7 + 3) as u8;
            master[i] = (255 - i * 5) as u8;
        }
        (session, master)
    }

    #[test]
    fn hello_round_trip() {
        let (session, master) = keys();
        let body = encode_hello(&session, &master);
        let recovered = decode_hello(&body, &master).unwrap();
        assert_eq!(recovered, session);
    }

    #[test]
    fn hello_tamper_rejected() {
        let (session, master) = keys();
        let mut body = encode_hello(&session, &master);
        body[32 + 10] ^= 0x40;
        assert!(matches!(decode_hello(&body, &master), Err(HandshakeError::BadMagic)));
    }

    #[test]
    fn hello_wrong_master_rejected() {
        let (session, master) = keys();
        let body = encode_hello(&session, &master);
        let mut wrong = master;
        wrong[0] ^= 1;
        assert!(decode_hello(&body, &wrong).is_err());
    }

    #[test]
    fn master_key_padding() {
        let key = master_key_from_env("short");
        assert_eq!(&key[..5], b"short");
        assert!(key[5..].iter().all(|&b| b == 0));

        let long = "x".repeat(50);
        let key = master_key_from_env(&long);
        assert!(key.iter().all(|&b| b == b'x'));
    }

    #[test]
    fn seal_open_round_trip_gcm() {
        let (session, _) = keys();
        let sealed = seal_message(CipherAlgo::Aes256Gcm, &session, 777, b"subspace hail").unwrap();
        assert_eq!(sealed.ciphertext.len(), b"subspace hail".len());
        let open =
            open_message(CipherAlgo::Aes256Gcm, &session, 777, &sealed.iv, &sealed.tag, &sealed.ciphertext).unwrap();
        assert_eq!(open, b"subspace hail");
    }

    #[test]
    fn seal_open_round_trip_chacha() {
        let (session, _) = keys();
        let sealed =
            seal_message(CipherAlgo::ChaCha20Poly1305, &session, -9, b"red alert").unwrap();
        let open = open_message(
            CipherAlgo::ChaCha20Poly1305,
            &session,
            -9,
            &sealed.iv,
            &sealed.tag,
            &sealed.ciphertext,
        )
        .unwrap();
        assert_eq!(open, b"red alert");
    }

    #[test]
    fn wrong_frame_id_fails_to_open() {
        let (session, _) = keys();
        let sealed = seal_message(CipherAlgo::Aes256Gcm, &session, 100, b"cloak status").unwrap();
        let out = open_message(CipherAlgo::Aes256Gcm, &session, 101, &sealed.iv, &sealed.tag, &sealed.ciphertext);
        assert!(out.is_err());
    }

    #[test]
    fn bad_tag_fails_to_open() {
        let (session, _) = keys();
        let sealed = seal_message(CipherAlgo::Pqc, &session, 5, b"evasive pattern delta").unwrap();
        let mut tag = sealed.tag;
        tag[0] ^= 1;
        assert!(open_message(CipherAlgo::Pqc, &session, 5, &sealed.iv, &tag, &sealed.ciphertext).is_err());
    }

    #[test]
    fn legacy_ciphers_unsupported() {
        let (session, _) = keys();
        assert!(matches!(
            seal_message(CipherAlgo::Rc4, &session, 0, b"x"),
            Err(CryptoError::Unsupported(CipherAlgo::Rc4))
        ));
    }

    #[test]
    fn signature_round_trip() {
        let signing = SigningKey::generate(&mut rand::rngs::OsRng);
        let public = signing.verifying_key().to_bytes();
        let sig = sign_text(&signing, b"engage");
        assert!(verify_text(&public, &sig, b"engage"));
        assert!(!verify_text(&public, &sig, b"disengage"));
    }

    #[test]
    fn cipher_names_parse() {
        assert_eq!(CipherAlgo::from_name("aes"), Some(CipherAlgo::Aes256Gcm));
        assert_eq!(CipherAlgo::from_name("off"), Some(CipherAlgo::None));
        assert_eq!(CipherAlgo::from_name("warp"), None);
        assert!(CipherAlgo::Pqc.is_supported());
        assert!(!CipherAlgo::DesCbc.is_supported());
        assert_eq!(CipherAlgo::from_u8(2), CipherAlgo::ChaCha20Poly1305);
    }
}
