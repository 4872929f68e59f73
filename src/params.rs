//! Request parameters describing one client identity and its token endpoint.
//!
//! Parameters are validated once by [`AuthRequestParamsBuilder`] and stay read-only for the
//! lifetime of the exchange client. They also deserialize from configuration files; the same
//! validation runs on that path.

/// Builder API for assembling request parameters.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::ScopeSet, sign::CredentialSource};

/// Validated parameters for the JWT bearer exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AuthRequestParamsBuilder")]
pub struct AuthRequestParams {
	/// OAuth client identifier; used as the assertion issuer and the `client_id` form field.
	pub client_id: String,
	/// Assertion audience, usually the authorization server's issuer identifier.
	pub audience: String,
	/// Optional assertion subject (the principal being impersonated).
	pub subject: Option<String>,
	/// Requested scopes; an empty set omits the `scope` claim.
	pub scopes: ScopeSet,
	/// Token endpoint receiving the exchange.
	pub token_endpoint: Url,
	/// PEM credential used to sign assertions.
	pub credential: CredentialSource,
}
impl AuthRequestParams {
	/// Creates a new builder for the provided client identifier.
	pub fn builder(client_id: impl Into<String>) -> AuthRequestParamsBuilder {
		AuthRequestParamsBuilder::new(client_id)
	}
}
