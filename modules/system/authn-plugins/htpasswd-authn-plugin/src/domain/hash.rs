//! Password hash verification for htpasswd entries.
//!
//! Every verifier is a pure function of the candidate password and the stored
//! hash. Digest comparisons are constant time.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use sha1::Sha1;
use subtle::ConstantTimeEq;

const APR1_MAGIC: &str = "$apr1$";
const MD5_CRYPT_MAGIC: &str = "$1$";
const SHA_PREFIX: &str = "{SHA}";
const SSHA_PREFIX: &str = "{SSHA}";
const SHA1_LEN: usize = 20;
const MD5_CRYPT_MAX_SALT: usize = 8;
const MD5_CRYPT_ROUNDS: usize = 1000;
const CRYPT_ALPHABET: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Storage format of an htpasswd hash, recognised by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFormat {
    Bcrypt,
    AprMd5,
    CryptMd5,
    Sha,
    SaltedSha,
    Plain,
}

impl HashFormat {
    #[must_use]
    pub fn detect(stored: &str) -> Self {
        if ["$2y$", "$2a$", "$2b$"].iter().any(|p| stored.starts_with(p)) {
            Self::Bcrypt
        } else if stored.starts_with(APR1_MAGIC) {
            Self::AprMd5
        } else if stored.starts_with(MD5_CRYPT_MAGIC) {
            Self::CryptMd5
        } else if stored.starts_with(SSHA_PREFIX) {
            Self::SaltedSha
        } else if stored.starts_with(SHA_PREFIX) {
            Self::Sha
        } else {
            Self::Plain
        }
    }
}

/// Check `password` against an htpasswd hash of any supported format.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    match HashFormat::detect(stored) {
        HashFormat::Bcrypt => bcrypt::verify(password, stored).unwrap_or(false),
        HashFormat::AprMd5 => verify_md5_crypt(password, stored, APR1_MAGIC),
        HashFormat::CryptMd5 => verify_md5_crypt(password, stored, MD5_CRYPT_MAGIC),
        HashFormat::Sha => verify_sha(password, stored),
        HashFormat::SaltedSha => verify_salted_sha(password, stored),
        HashFormat::Plain => constant_time_eq(password.as_bytes(), stored.as_bytes()),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

fn verify_sha(password: &str, stored: &str) -> bool {
    let Some(expected) = stored.strip_prefix(SHA_PREFIX) else {
        return false;
    };
    let actual = STANDARD.encode(Sha1::digest(password.as_bytes()));
    constant_time_eq(actual.as_bytes(), expected.as_bytes())
}

fn verify_salted_sha(password: &str, stored: &str) -> bool {
    let Some(encoded) = stored.strip_prefix(SSHA_PREFIX) else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(encoded) else {
        return false;
    };
    if decoded.len() <= SHA1_LEN {
        return false;
    }
    let (expected, salt) = decoded.split_at(SHA1_LEN);

    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);
    constant_time_eq(hasher.finalize().as_slice(), expected)
}

fn verify_md5_crypt(password: &str, stored: &str, magic: &str) -> bool {
    let Some(rest) = stored.strip_prefix(magic) else {
        return false;
    };
    let Some((salt, _)) = rest.split_once('$') else {
        return false;
    };
    let computed = md5_crypt(password.as_bytes(), salt, magic);
    constant_time_eq(computed.as_bytes(), stored.as_bytes())
}

/// The FreeBSD MD5 crypt scheme; Apache's `$apr1$` is the same with another magic.
fn md5_crypt(password: &[u8], salt: &str, magic: &str) -> String {
    let salt = salt.get(..MD5_CRYPT_MAX_SALT).unwrap_or(salt);

    let mut alternate = Md5::new();
    alternate.update(password);
    alternate.update(salt.as_bytes());
    alternate.update(password);
    let alternate = alternate.finalize();

    let mut ctx = Md5::new();
    ctx.update(password);
    ctx.update(magic.as_bytes());
    ctx.update(salt.as_bytes());
    let mut remaining = password.len();
    while remaining > 0 {
        let take = remaining.min(alternate.len());
        ctx.update(&alternate[..take]);
        remaining -= take;
    }
    let mut bits = password.len();
    while bits > 0 {
        if bits & 1 == 1 {
            ctx.update([0u8]);
        } else {
            ctx.update(&password[..1]);
        }
        bits >>= 1;
    }
    let mut digest = ctx.finalize();

    for round in 0..MD5_CRYPT_ROUNDS {
        let mut ctx = Md5::new();
        if round & 1 == 1 {
            ctx.update(password);
        } else {
            ctx.update(digest.as_slice());
        }
        if round % 3 != 0 {
            ctx.update(salt.as_bytes());
        }
        if round % 7 != 0 {
            ctx.update(password);
        }
        if round & 1 == 1 {
            ctx.update(digest.as_slice());
        } else {
            ctx.update(password);
        }
        digest = ctx.finalize();
    }

    let mut out = String::with_capacity(magic.len() + salt.len() + 23);
    out.push_str(magic);
    out.push_str(salt);
    out.push('$');
    for (a, b, c) in [(0, 6, 12), (1, 7, 13), (2, 8, 14), (3, 9, 15), (4, 10, 5)] {
        push_crypt_base64(&mut out, digest[a], digest[b], digest[c], 4);
    }
    push_crypt_base64(&mut out, 0, 0, digest[11], 2);
    out
}

fn push_crypt_base64(out: &mut String, high: u8, mid: u8, low: u8, chars: usize) {
    let mut value = (u32::from(high) << 16) | (u32::from(mid) << 8) | u32::from(low);
    for _ in 0..chars {
        out.push(char::from(CRYPT_ALPHABET[(value & 0x3f) as usize]));
        value >>= 6;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_by_prefix() {
        assert_eq!(HashFormat::detect("$2y$05$abc"), HashFormat::Bcrypt);
        assert_eq!(HashFormat::detect("$2a$05$abc"), HashFormat::Bcrypt);
        assert_eq!(HashFormat::detect("$2b$05$abc"), HashFormat::Bcrypt);
        assert_eq!(HashFormat::detect("$2x$05$abc"), HashFormat::Plain);
        assert_eq!(HashFormat::detect("$apr1$salt$hash"), HashFormat::AprMd5);
        assert_eq!(HashFormat::detect("$1$salt$hash"), HashFormat::CryptMd5);
        assert_eq!(HashFormat::detect("{SHA}abc="), HashFormat::Sha);
        assert_eq!(HashFormat::detect("{SSHA}abc="), HashFormat::SaltedSha);
        assert_eq!(HashFormat::detect("hunter2"), HashFormat::Plain);
    }

    #[test]
    fn md5_crypt_reproduces_known_hash() {
        assert_eq!(
            md5_crypt(b"mickey5", "D89ubl/e", MD5_CRYPT_MAGIC),
            "$1$D89ubl/e$dJ8XW4DfrJHTrnwCdx3Ji1"
        );
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("pw", "$apr1$no-terminator"));
        assert!(!verify_password("pw", "{SSHA}!!!not-base64"));
        assert!(!verify_password("pw", "{SSHA}c2hvcnQ="));
        assert!(!verify_password("pw", "$2y$05$truncated"));
    }

    #[test]
    fn empty_password_only_matches_empty_plain_entry() {
        assert!(verify_password("", ""));
        assert!(!verify_password("", "$1$D89ubl/e$dJ8XW4DfrJHTrnwCdx3Ji1"));
    }
}
