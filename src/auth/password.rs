//! PBKDF2-SHA256 password hashes in modular-crypt form:
//! `$pbkdf2-sha256$<rounds>$<salt>$<digest>`, salt and digest in adapted base64.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use rand::RngCore;
use sha2::Sha256;

use crate::error::AppError;

const SCHEME: &str = "pbkdf2-sha256";
const DEFAULT_ROUNDS: u32 = 29_000;
const SALT_SIZE: usize = 16;
const DIGEST_SIZE: usize = 32;

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = derive(password, &salt, DEFAULT_ROUNDS);
    encode(DEFAULT_ROUNDS, &salt, &digest)
}

/// Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Some((rounds, salt, expected)) = decode(hash) else {
        return false;
    };
    let actual = derive(password, &salt, rounds);
    constant_time_eq(&actual, &expected)
}

/// Runs `verify_password` on the blocking thread pool.
pub async fn verify_password_blocking(password: &str, hash: &str) -> Result<bool, AppError> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; DIGEST_SIZE] {
    let mut out = [0u8; DIGEST_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

fn encode(rounds: u32, salt: &[u8], digest: &[u8]) -> String {
    let (salt, digest) = (ab64_encode(salt), ab64_encode(digest));
    format!("${SCHEME}${rounds}${salt}${digest}")
}

fn decode(hash: &str) -> Option<(u32, Vec<u8>, Vec<u8>)> {
    let mut parts = hash.strip_prefix('$')?.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let rounds: u32 = parts.next()?.parse().ok().filter(|r| *r > 0)?;
    let salt = ab64_decode(parts.next()?)?;
    let digest = ab64_decode(parts.next()?)?;
    if parts.next().is_some() || digest.len() != DIGEST_SIZE {
        return None;
    }
    Some((rounds, salt, digest))
}

fn ab64_encode(bytes: &[u8]) -> String {
    STANDARD_NO_PAD.encode(bytes).replace('+', ".")
}

fn ab64_decode(text: &str) -> Option<Vec<u8>> {
    STANDARD_NO_PAD.decode(text.replace('.', "+")).ok()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
