//! Encrypted keystore decryption (Web3 Secret Storage v3).
//!
//! # Data Flow
//! ```text
//! keystore JSON + passphrase
//!     → KDF (scrypt | pbkdf2-hmac-sha256) → derived key
//!     → MAC check: keccak256(dk[16..32] ‖ ciphertext)
//!     → AES-128-CTR(dk[0..16], iv) → private key
//!     → Identity
//! ```
//!
//! # Security
//! - Derived key and plaintext buffers are zeroised on every path
//! - The passphrase is borrowed for the call only
//! - A wrong passphrase never yields partial key material

use alloy::primitives::{keccak256, Address};
use alloy::signers::local::PrivateKeySigner;
use ctr::cipher::{KeyIvInit, StreamCipher};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::blockchain::wallet::Identity;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

/// Failures turning a keystore blob into an [`Identity`].
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// Authentication failed: wrong passphrase or a damaged blob.
    #[error("invalid passphrase or corrupt keystore")]
    InvalidPassphraseOrCorruptKey,

    /// The blob is well-formed but cannot be decoded by this implementation.
    #[error("unexpected decryption error: {0}")]
    UnexpectedDecryptionError(String),
}

#[derive(Deserialize)]
struct KeystoreFile {
    #[serde(alias = "Crypto")]
    crypto: CryptoSection,
    address: Option<String>,
    version: u32,
}

#[derive(Deserialize)]
struct CryptoSection {
    cipher: String,
    cipherparams: CipherParams,
    ciphertext: String,
    kdf: String,
    kdfparams: KdfParams,
    mac: String,
}

#[derive(Deserialize)]
struct CipherParams {
    iv: String,
}

#[derive(Deserialize)]
struct KdfParams {
    dklen: usize,
    salt: String,
    // scrypt
    n: Option<u64>,
    r: Option<u32>,
    p: Option<u32>,
    // pbkdf2
    c: Option<u32>,
    prf: Option<String>,
}

const MIN_DKLEN: usize = 32;
const MAX_DKLEN: usize = 64;
const IV_LEN: usize = 16;

/// Source of the run's signing identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeySource;

impl KeySource {
    /// Decrypt a keystore blob with `passphrase`.
    pub fn decrypt(&self, blob: &str, passphrase: &str) -> Result<Identity, KeystoreError> {
        let file: KeystoreFile =
            serde_json::from_str(blob).map_err(|_| KeystoreError::InvalidPassphraseOrCorruptKey)?;

        if file.version != 3 {
            return Err(unexpected(format!("unsupported keystore version {}", file.version)));
        }
        let crypto = &file.crypto;
        if crypto.cipher != "aes-128-ctr" {
            return Err(unexpected(format!("unsupported cipher '{}'", crypto.cipher)));
        }

        let salt = decode_hex(&crypto.kdfparams.salt)?;
        let iv = decode_hex(&crypto.cipherparams.iv)?;
        if iv.len() != IV_LEN {
            return Err(KeystoreError::InvalidPassphraseOrCorruptKey);
        }
        let ciphertext = decode_hex(&crypto.ciphertext)?;
        let mac = decode_hex(&crypto.mac)?;

        let derived = derive_key(&crypto.kdf, &crypto.kdfparams, passphrase.as_bytes(), &salt)?;

        let mut preimage = Zeroizing::new(Vec::with_capacity(16 + ciphertext.len()));
        preimage.extend_from_slice(&derived[16..32]);
        preimage.extend_from_slice(&ciphertext);
        if keccak256(preimage.as_slice()).as_slice() != mac.as_slice() {
            return Err(KeystoreError::InvalidPassphraseOrCorruptKey);
        }

        let mut secret = Zeroizing::new(ciphertext);
        let mut cipher = Aes128Ctr::new_from_slices(&derived[..16], &iv)
            .map_err(|e| unexpected(format!("bad cipher parameters: {e}")))?;
        cipher.apply_keystream(secret.as_mut_slice());

        let signer = PrivateKeySigner::from_slice(&secret)
            .map_err(|e| unexpected(format!("decrypted key is not a valid secp256k1 key: {e}")))?;

        if let Some(declared) = file.address.as_deref() {
            let declared = declared.strip_prefix("0x").unwrap_or(declared);
            let declared: Address = declared
                .parse()
                .map_err(|_| KeystoreError::InvalidPassphraseOrCorruptKey)?;
            if declared != signer.address() {
                return Err(KeystoreError::InvalidPassphraseOrCorruptKey);
            }
        }

        Ok(Identity::from_signer(signer))
    }
}

fn derive_key(
    kdf: &str,
    params: &KdfParams,
    passphrase: &[u8],
    salt: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
    if !(MIN_DKLEN..=MAX_DKLEN).contains(&params.dklen) {
        return Err(unexpected(format!(
            "derived key length {} is outside {MIN_DKLEN}..={MAX_DKLEN}",
            params.dklen
        )));
    }
    let mut derived = Zeroizing::new(vec![0u8; params.dklen]);

    match kdf {
        "scrypt" => {
            let (n, r, p) = match (params.n, params.r, params.p) {
                (Some(n), Some(r), Some(p)) => (n, r, p),
                _ => return Err(unexpected("scrypt parameters n, r and p are required")),
            };
            if !n.is_power_of_two() || n < 2 {
                return Err(unexpected(format!("scrypt n = {n} is not a power of two")));
            }
            let log_n = n.trailing_zeros() as u8;
            let scrypt_params = scrypt::Params::new(log_n, r, p, params.dklen)
                .map_err(|e| unexpected(format!("invalid scrypt parameters: {e}")))?;
            scrypt::scrypt(passphrase, salt, &scrypt_params, derived.as_mut_slice())
                .map_err(|e| unexpected(format!("scrypt failed: {e}")))?;
        }
        "pbkdf2" => {
            match params.prf.as_deref() {
                Some("hmac-sha256") => {}
                other => return Err(unexpected(format!("unsupported pbkdf2 prf {other:?}"))),
            }
            let rounds = params
                .c
                .filter(|c| *c > 0)
                .ok_or_else(|| unexpected("pbkdf2 iteration count is required"))?;
            pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, rounds, derived.as_mut_slice());
        }
        other => return Err(unexpected(format!("unsupported kdf '{other}'"))),
    }

    Ok(derived)
}

fn decode_hex(value: &str) -> Result<Vec<u8>, KeystoreError> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value))
        .map_err(|_| KeystoreError::InvalidPassphraseOrCorruptKey)
}

fn unexpected(reason: impl Into<String>) -> KeystoreError {
    KeystoreError::UnexpectedDecryptionError(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Published Web3 Secret Storage test vector (pbkdf2, password "testpassword").
    const PBKDF2_VECTOR: &str = r#"{
        "crypto": {
            "cipher": "aes-128-ctr",
            "cipherparams": { "iv": "6087dab2f9fdbbfaddc31a909735c1e6" },
            "ciphertext": "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46",
            "kdf": "pbkdf2",
            "kdfparams": {
                "c": 262144,
                "dklen": 32,
                "prf": "hmac-sha256",
                "salt": "ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0bd"
            },
            "mac": "517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9e51205e9b2"
        },
        "id": "3198bc9c-6672-5ab3-d995-4942343ae5b6",
        "version": 3
    }"#;

    const ANVIL_KEY: [u8; 32] = [
        0xac, 0x09, 0x74, 0xbe, 0xc3, 0x9a, 0x17, 0xe3, 0x6b, 0xa4, 0xa6, 0xb4, 0xd2, 0x38, 0xff,
        0x94, 0x4b, 0xac, 0xb4, 0x78, 0xcb, 0xed, 0x5e, 0xfc, 0xae, 0x78, 0x4d, 0x7b, 0xf4, 0xf2,
        0xff, 0x80,
    ];

    /// Encrypt `secret` into a v3 keystore with cheap KDF settings.
    fn seal(secret: &[u8; 32], passphrase: &str, kdf: &str) -> String {
        let salt = [7u8; 32];
        let iv = [9u8; 16];
        let mut derived = [0u8; 32];
        let kdfparams = match kdf {
            "scrypt" => {
                let params = scrypt::Params::new(4, 8, 1, 32).unwrap();
                scrypt::scrypt(passphrase.as_bytes(), &salt, &params, &mut derived).unwrap();
                serde_json::json!({ "dklen": 32, "n": 16, "r": 8, "p": 1, "salt": hex::encode(salt) })
            }
            _ => {
                pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), &salt, 2, &mut derived);
                serde_json::json!({ "dklen": 32, "c": 2, "prf": "hmac-sha256", "salt": hex::encode(salt) })
            }
        };

        let mut ciphertext = secret.to_vec();
        Aes128Ctr::new_from_slices(&derived[..16], &iv)
            .unwrap()
            .apply_keystream(&mut ciphertext);

        let mut preimage = derived[16..32].to_vec();
        preimage.extend_from_slice(&ciphertext);
        let mac = keccak256(&preimage);

        serde_json::json!({
            "crypto": {
                "cipher": "aes-128-ctr",
                "cipherparams": { "iv": hex::encode(iv) },
                "ciphertext": hex::encode(&ciphertext),
                "kdf": kdf,
                "kdfparams": kdfparams,
                "mac": hex::encode(mac),
            },
            "version": 3
        })
        .to_string()
    }

    fn with_field(blob: &str, path: &[&str], value: serde_json::Value) -> String {
        let mut json: serde_json::Value = serde_json::from_str(blob).unwrap();
        let mut node = &mut json;
        for key in &path[..path.len() - 1] {
            node = node.get_mut(*key).unwrap();
        }
        node[path[path.len() - 1]] = value;
        json.to_string()
    }

    #[test]
    fn test_published_pbkdf2_vector() {
        let identity = KeySource.decrypt(PBKDF2_VECTOR, "testpassword").unwrap();
        assert_eq!(
            identity.address().to_string().to_lowercase(),
            "0x008aeeda4d805471df9b2a5b0f38a0c3bcba786b"
        );
    }

    #[test]
    fn test_scrypt_and_pbkdf2_yield_same_identity() {
        let expected = PrivateKeySigner::from_slice(&ANVIL_KEY).unwrap().address();

        for kdf in ["scrypt", "pbkdf2"] {
            let blob = seal(&ANVIL_KEY, "hunter2", kdf);
            let identity = KeySource.decrypt(&blob, "hunter2").unwrap();
            assert_eq!(identity.address(), expected, "kdf {kdf}");
        }
    }

    #[test]
    fn test_address_is_deterministic() {
        let blob = seal(&ANVIL_KEY, "hunter2", "pbkdf2");
        let a = KeySource.decrypt(&blob, "hunter2").unwrap();
        let b = KeySource.decrypt(&blob, "hunter2").unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn test_wrong_passphrase() {
        let blob = seal(&ANVIL_KEY, "hunter2", "scrypt");
        let err = KeySource.decrypt(&blob, "hunter3").unwrap_err();
        assert!(matches!(err, KeystoreError::InvalidPassphraseOrCorruptKey));
        assert!(!err.to_string().contains("ac0974"));
    }

    #[test]
    fn test_malformed_blob_is_corrupt() {
        for blob in ["", "not json", "{\"version\": 3}"] {
            assert!(matches!(
                KeySource.decrypt(blob, "x"),
                Err(KeystoreError::InvalidPassphraseOrCorruptKey)
            ));
        }

        let blob = with_field(
            &seal(&ANVIL_KEY, "hunter2", "pbkdf2"),
            &["crypto", "ciphertext"],
            serde_json::json!("zz"),
        );
        assert!(matches!(
            KeySource.decrypt(&blob, "hunter2"),
            Err(KeystoreError::InvalidPassphraseOrCorruptKey)
        ));
    }

    #[test]
    fn test_declared_address_mismatch_is_corrupt() {
        let blob = with_field(
            &seal(&ANVIL_KEY, "hunter2", "pbkdf2"),
            &["address"],
            serde_json::json!("0000000000000000000000000000000000000001"),
        );
        assert!(matches!(
            KeySource.decrypt(&blob, "hunter2"),
            Err(KeystoreError::InvalidPassphraseOrCorruptKey)
        ));
    }

    #[test]
    fn test_unsupported_parameters_are_unexpected() {
        let base = seal(&ANVIL_KEY, "hunter2", "pbkdf2");
        let cases = [
            with_field(&base, &["crypto", "cipher"], serde_json::json!("aes-256-gcm")),
            with_field(&base, &["crypto", "kdf"], serde_json::json!("argon2")),
            with_field(&base, &["crypto", "kdfparams", "prf"], serde_json::json!("hmac-sha512")),
            with_field(&base, &["version"], serde_json::json!(1)),
        ];

        for blob in cases {
            assert!(matches!(
                KeySource.decrypt(&blob, "hunter2"),
                Err(KeystoreError::UnexpectedDecryptionError(_))
            ));
        }
    }

    #[test]
    fn test_scrypt_n_must_be_power_of_two() {
        let blob = with_field(
            &seal(&ANVIL_KEY, "hunter2", "scrypt"),
            &["crypto", "kdfparams", "n"],
            serde_json::json!(15),
        );
        assert!(matches!(
            KeySource.decrypt(&blob, "hunter2"),
            Err(KeystoreError::UnexpectedDecryptionError(_))
        ));
    }

    #[test]
    fn test_oversized_dklen_is_rejected_before_derivation() {
        let base = seal(&ANVIL_KEY, "hunter2", "pbkdf2");
        for dklen in [serde_json::json!(65), serde_json::json!(u64::MAX)] {
            let blob = with_field(&base, &["crypto", "kdfparams", "dklen"], dklen);
            assert!(matches!(
                KeySource.decrypt(&blob, "hunter2"),
                Err(KeystoreError::UnexpectedDecryptionError(_))
            ));
        }
    }

    #[test]
    fn test_wrong_iv_length_is_corrupt() {
        let blob = with_field(
            &seal(&ANVIL_KEY, "hunter2", "pbkdf2"),
            &["crypto", "cipherparams", "iv"],
            serde_json::json!("0909090909"),
        );
        assert!(matches!(
            KeySource.decrypt(&blob, "hunter2"),
            Err(KeystoreError::InvalidPassphraseOrCorruptKey)
        ));
    }
}
