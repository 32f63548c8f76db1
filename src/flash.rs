// ABOUTME: One-shot status messages carried across redirects in a signed cookie
// ABOUTME: Written by write handlers and consumed by the next rendered page

use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};

const FLASH_COOKIE_NAME: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Failure,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Failure => "failure",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(FlashKind::Success),
            "failure" | "error" | "danger" => Some(FlashKind::Failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Failure,
            message: message.into(),
        }
    }

    fn encode(&self) -> String {
        format!("{}|{}", self.kind.as_str(), urlencoding::encode(&self.message))
    }

    fn decode(value: &str) -> Option<Self> {
        let (kind, message) = value.split_once('|')?;
        Some(Self {
            kind: FlashKind::parse(kind)?,
            message: urlencoding::decode(message).ok()?.into_owned(),
        })
    }
}

/// Derives the 64-byte cookie signing key from the configured secret.
pub fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

pub fn set_flash(jar: SignedCookieJar, flash: Flash) -> SignedCookieJar {
    let cookie = Cookie::build((FLASH_COOKIE_NAME, flash.encode()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    jar.add(cookie)
}

pub fn take_flash(jar: SignedCookieJar) -> (SignedCookieJar, Option<Flash>) {
    let flash = jar
        .get(FLASH_COOKIE_NAME)
        .and_then(|cookie| Flash::decode(cookie.value()));

    if flash.is_some() {
        let jar = jar.remove(Cookie::build(FLASH_COOKIE_NAME).path("/"));
        (jar, flash)
    } else {
        (jar, None)
    }
}
