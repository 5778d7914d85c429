use axum::{
    extract::{FromRequest, FromRequestParts, Path},
    http::request::Parts,
};

use crate::{AppError, validate::sanitize};

/// JSON body whose rejections are reported as [`AppError::InvalidInput`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Body<T>(pub T);

/// Path parameter whose rejections are reported as [`AppError::NotFound`].
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct IdPath<T>(pub T);

/// The participant named by the `User` header.
#[derive(Debug, Clone)]
pub struct User(pub String);

impl<S: Send + Sync> FromRequestParts<S> for User {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("user")
            .ok_or_else(|| AppError::invalid("missing User header"))?;

        let name = sanitize(&String::from_utf8_lossy(raw.as_bytes()));
        if name.is_empty() {
            return Err(AppError::invalid("User header must not be empty"));
        }
        Ok(Self(name))
    }
}
