#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Every supported hash format against five user/password pairs.

use htpasswd_authn_plugin::{HashFormat, verify_password};

const PASSWORDS: [&str; 5] = ["mickey5", "alexandrew", "hawaiicats78", "DIENOW", "e8f685"];

const APR1: [&str; 5] = [
    "$apr1$gxNb79DX$6wi9QaGNM5TA0kBKiC4710",
    "$apr1$kv1uUfCO$iEwrWojf92uZ/9uhTQmMo.",
    "$apr1$UQ6GxE7V$OrIqWONGuSV9RfS3B2dfO1",
    "$apr1$OZ.RwYJH$AwfW2h0gJnu2fQi0GegVe1",
    "$apr1$9r9GyMpL$3IiaLNos/tbouLJwsW8ey/",
];

const MD5_CRYPT: [&str; 5] = [
    "$1$D89ubl/e$dJ8XW4DfrJHTrnwCdx3Ji1",
    "$1$D89ubl/e$xuQ74IxhM3J10sv0QHVgA/",
    "$1$D89ubl/e$Y07COBJSUbNDlYlFyRYUp.",
    "$1$D89ubl/e$4IZ.tBiqvtxt7Dpt1MkgE1",
    "$1$D89ubl/e$mLrBtDw8UTdAX7jDZLQIB0",
];

const SHA: [&str; 5] = [
    "{SHA}D9rQ8iK6feNAniulHNKdr5V38ok=",
    "{SHA}KS7VQqgAnMUfXgWmFCCa6DVhY+M=",
    "{SHA}mzD9ouM0P06arY0Obdb2KojkFeY=",
    "{SHA}2HrOk971ockoAr1Ct1o7GpvFLdU=",
    "{SHA}IyrjpSzIjrlLT7KjVh1q1LBDCFA=",
];

const SSHA: [&str; 5] = [
    "{SSHA}KHQzbbDgqjRkfd7li1NBL7kI0D5oMzBM",
    "{SSHA}OFxiAyw1TSNiyGybLyjVg+yewdhoMzBM",
    "{SSHA}FeUKUVnpp9IlolmuqfIMUYaa3/doMzBM",
    "{SSHA}mfDeU9QRfvED1gfBExrJgDsi74xoMzBM",
    "{SSHA}Y3eY1xbgHUOFKOPoiLwluYlsd3FoMzBM",
];

const BCRYPT: [&str; 5] = [
    "$2y$05$fpu.jNd5fPlx3ggfZ2BWR.Wc3/hc7ke7LsIpwZM6/e0B6VniqFRIW",
    "$2y$05$4QmbRfzXERVFyLbUdtCd8ekz1pAfNB5ZsmXevnKgSMc3XHqDYm2wa",
    "$2y$05$.V03HbzL5HAdwq8DYbt/JOVi/crBiqSXvsgNLHucGLLBpApHjK0Di",
    "$2y$05$/jwDvqAoKjNWwRpUzyLvcuhcSloP9tjxAlPfAUlVvVtmMpBPEC9s2",
    "$2y$05$yVjPeTy8/FIUZAJWSSmnAO7GsWHFA2jVeBWFF6Y6RoWEpoxGxtFzS",
];

const BCRYPT_2A: [&str; 5] = [
    "$2a$06$abcdefghijklmnopqrstuuvIL8eD/kno41wjEVxrmyQK00B3lVYT.",
    "$2a$06$AbCdEfGhIjKlMnOpQrStUuE/R7E7QhovLUQBILUssgJnvi1oczN7y",
    "$2a$06$0123456789./ABCDEFGHIeyZ0ekP85rCVJpNHIwoIf/R0LFpurgUG",
    "$2a$06$zyxwvutsrqponmlkjihgfePbma0VVYDimYZTlIqoQAkVOV8pI8v5K",
    "$2a$06$MOPQRSTUVWXYZ01234567uFfuW0tfksXbnC40w1M/Oy93nMsf8nXS",
];

fn check(format: HashFormat, hashes: &[&str; 5]) {
    for (password, hash) in PASSWORDS.iter().zip(hashes) {
        assert_eq!(HashFormat::detect(hash), format, "{hash}");
        assert!(verify_password(password, hash), "{password} should match {hash}");
        let wrong = format!("{password}x");
        assert!(!verify_password(&wrong, hash), "{wrong} should not match {hash}");
    }
}

#[test]
fn apache_md5() {
    check(HashFormat::AprMd5, &APR1);
}

#[test]
fn crypt_md5() {
    check(HashFormat::CryptMd5, &MD5_CRYPT);
}

#[test]
fn unsalted_sha1() {
    check(HashFormat::Sha, &SHA);
}

#[test]
fn salted_sha1() {
    check(HashFormat::SaltedSha, &SSHA);
}

#[test]
fn bcrypt() {
    check(HashFormat::Bcrypt, &BCRYPT);
}

#[test]
fn bcrypt_2a() {
    check(HashFormat::Bcrypt, &BCRYPT_2A);
}

#[test]
fn plaintext() {
    check(HashFormat::Plain, &PASSWORDS);
}
