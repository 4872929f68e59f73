//! Immutable access token values and their expiry helpers.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced when constructing an [`AccessToken`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum AccessTokenError {
	/// Issued when the token string is empty.
	#[error("Access token value cannot be empty.")]
	EmptyToken,
	/// Issued when the expiry does not lie after the production instant.
	#[error("Access token must expire after it was produced.")]
	NotInFuture,
	/// Issued when the relative lifetime overflows the supported range.
	#[error("Access token lifetime exceeds the supported range.")]
	LifetimeOutOfRange,
}

/// Bearer access token paired with its absolute expiry.
///
/// Values are immutable; the cache replaces them wholesale and shares them behind an [`Arc`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	token: TokenSecret,
	expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Creates a token that expires at `expires_at`, validated against the instant `now` it was
	/// produced.
	pub fn new(
		token: impl Into<String>,
		expires_at: OffsetDateTime,
		now: OffsetDateTime,
	) -> Result<Self, AccessTokenError> {
		let token = TokenSecret::new(token);

		if token.is_empty() {
			return Err(AccessTokenError::EmptyToken);
		}
		if expires_at <= now {
			return Err(AccessTokenError::NotInFuture);
		}

		Ok(Self { token, expires_at })
	}

	/// Creates a token that lives for `expires_in` starting at `issued_at`.
	pub fn expiring_in(
		token: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
	) -> Result<Self, AccessTokenError> {
		let expires_at =
			issued_at.checked_add(expires_in).ok_or(AccessTokenError::LifetimeOutOfRange)?;

		Self::new(token, expires_at, issued_at)
	}

	/// Returns the redacted secret wrapper.
	pub fn secret(&self) -> &TokenSecret {
		&self.token
	}

	/// Returns the raw bearer token. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		self.token.expose()
	}

	/// Absolute expiry instant.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Remaining lifetime at `instant`, clamped to zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Formats the `Authorization` header value for this token.
	pub fn authorization_header(&self) -> String {
		format!("Bearer {}", self.token.expose())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn expiring_in_computes_absolute_expiry() {
		let issued = datetime!(2025-01-01 00:00 UTC);
		let token = AccessToken::expiring_in("tok1", issued, Duration::seconds(5_000))
			.expect("Token should build successfully.");

		assert_eq!(token.expires_at(), issued + Duration::seconds(5_000));
		assert_eq!(token.expose(), "tok1");
		assert_eq!(token.authorization_header(), "Bearer tok1");
		assert_eq!(token.remaining_at(issued), Duration::seconds(5_000));
	}

	#[test]
	fn rejects_empty_and_past_tokens() {
		let now = datetime!(2025-01-01 00:00 UTC);

		assert_eq!(
			AccessToken::new("", now + Duration::minutes(1), now),
			Err(AccessTokenError::EmptyToken)
		);
		assert_eq!(AccessToken::new("tok", now, now), Err(AccessTokenError::NotInFuture));
		assert_eq!(
			AccessToken::expiring_in("tok", now, Duration::MAX),
			Err(AccessTokenError::LifetimeOutOfRange)
		);
	}

	#[test]
	fn expiry_helpers_clamp() {
		let now = datetime!(2025-01-01 00:00 UTC);
		let token = AccessToken::expiring_in("tok", now, Duration::seconds(30))
			.expect("Token should build successfully.");
		let later = now + Duration::minutes(5);

		assert!(!token.is_expired_at(now));
		assert!(token.is_expired_at(later));
		assert_eq!(token.remaining_at(later), Duration::ZERO);
	}

	#[test]
	fn debug_redacts_secret() {
		let now = datetime!(2025-01-01 00:00 UTC);
		let token = AccessToken::expiring_in("super-secret", now, Duration::seconds(30))
			.expect("Token should build successfully.");
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("super-secret"));
		assert!(rendered.contains("<redacted>"));
	}
}
