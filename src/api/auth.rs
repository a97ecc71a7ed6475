//! `/auth` routes.
//!
//! Input is checked against the backend's own rules first so an obviously
//! bad form never costs a round-trip. Persisting the returned token is the
//! session bootstrap's job, not this module's.

use super::{ApiClient, Call, Transport};
use crate::error::{Error, Result};
use crate::model::{LoginResponse, MessageResponse, User};
use crate::validate::{check_password, is_plausible_email};
use serde::Serialize;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    email: &'a str,
    password: &'a str,
    confirm_password: &'a str,
}

#[derive(Serialize)]
struct ForgotBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetBody<'a> {
    token: &'a str,
    new_password: &'a str,
    confirm_password: &'a str,
}

/// Auth service, borrowed from an [`ApiClient`].
pub struct Auth<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> Auth<'a, T> {
    pub(super) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// `RequiredField` for blank input; `Http` 401 for bad credentials.
    /// A 2xx without a readable token resolves to `None`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<LoginResponse>> {
        let email = required_email(email)?;
        if password.is_empty() {
            return Err(Error::RequiredField { field: "password" });
        }

        let call = Call::post("/auth/login")
            .json(&Credentials { email, password })?
            .fallback("Login failed");
        self.client.fetch(call).await
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the password breaks a rule or the
    /// confirmation differs; `Http` 400 when the email is taken.
    pub async fn register(&self, email: &str, password: &str, confirm: &str) -> Result<MessageResponse> {
        let email = required_email(email)?;
        check_new_password(password, confirm)?;

        let call = Call::post("/auth/register")
            .json(&RegisterBody {
                email,
                password,
                confirm_password: confirm,
            })?
            .fallback("Registration failed");
        Ok(self.client.fetch(call).await?.unwrap_or_default())
    }

    /// Request a reset link. The backend answers the same way whether or
    /// not the address exists.
    ///
    /// # Errors
    ///
    /// `RequiredField` / `InvalidArgument` for a bad address.
    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse> {
        let email = required_email(email)?;
        let call = Call::post("/auth/forgot-password")
            .json(&ForgotBody { email })?
            .fallback("Could not request a password reset");
        Ok(self.client.fetch(call).await?.unwrap_or_default())
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// `RequiredField` for a blank token, `InvalidArgument` for a weak or
    /// mismatched password, `Http` 400 for an expired token.
    pub async fn reset_password(&self, token: &str, new_password: &str, confirm: &str) -> Result<MessageResponse> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::RequiredField { field: "token" });
        }
        check_new_password(new_password, confirm)?;

        let call = Call::post("/auth/reset-password")
            .json(&ResetBody {
                token,
                new_password,
                confirm_password: confirm,
            })?
            .fallback("Password reset failed");
        Ok(self.client.fetch(call).await?.unwrap_or_default())
    }

    /// The user behind the stored token.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` without a token; `Http` 401 when it has expired.
    pub async fn me(&self) -> Result<Option<User>> {
        if !self.client.session().is_authenticated()? {
            return Err(Error::NotAuthenticated);
        }
        self.client
            .fetch(Call::get("/auth/me").fallback("Could not load the current user"))
            .await
    }
}

fn required_email(email: &str) -> Result<&str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::RequiredField { field: "email" });
    }
    if !is_plausible_email(email) {
        return Err(Error::InvalidArgument(format!("'{email}' is not a valid email address")));
    }
    Ok(email)
}

fn check_new_password(password: &str, confirm: &str) -> Result<()> {
    check_password(password).map_err(|rule| Error::InvalidArgument(rule.to_string()))?;
    if password != confirm {
        return Err(Error::InvalidArgument("Passwords do not match.".to_string()));
    }
    Ok(())
}
