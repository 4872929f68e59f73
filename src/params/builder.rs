// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, ScopeValidationError},
	params::AuthRequestParams,
	sign::CredentialSource,
};

/// Errors raised while constructing or validating request parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum AuthRequestParamsError {
	/// Client identifier is blank.
	#[error("Client identifier cannot be empty.")]
	EmptyClientId,
	/// Audience is mandatory for every assertion.
	#[error("Missing assertion audience.")]
	MissingAudience,
	/// Audience is blank.
	#[error("Assertion audience cannot be empty.")]
	EmptyAudience,
	/// Subject was supplied but blank.
	#[error("Assertion subject cannot be empty when present.")]
	EmptySubject,
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Token endpoint must be reachable over HTTP(S).
	#[error("The token endpoint must use http or https: {url}.")]
	UnsupportedEndpointScheme {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Signing credential is mandatory.
	#[error("Missing signing credential.")]
	MissingCredential,
	/// Requested scopes cannot be normalized.
	#[error(transparent)]
	InvalidScope(#[from] ScopeValidationError),
}

/// Builder for [`AuthRequestParams`] values.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthRequestParamsBuilder {
	/// OAuth client identifier.
	pub client_id: String,
	/// Assertion audience.
	#[serde(default)]
	pub audience: Option<String>,
	/// Optional assertion subject.
	#[serde(default)]
	pub subject: Option<String>,
	/// Requested scopes.
	#[serde(default)]
	pub scopes: ScopeSet,
	/// Token endpoint receiving the exchange.
	#[serde(default)]
	pub token_endpoint: Option<Url>,
	/// PEM credential used to sign assertions.
	#[serde(default)]
	pub credential: Option<CredentialSource>,
}
impl AuthRequestParamsBuilder {
	/// Creates a new builder seeded with the provided client identifier.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			audience: None,
			subject: None,
			scopes: ScopeSet::default(),
			token_endpoint: None,
			credential: None,
		}
	}

	/// Sets the assertion audience.
	pub fn audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = Some(audience.into());

		self
	}

	/// Sets the assertion subject.
	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = Some(subject.into());

		self
	}

	/// Replaces the requested scopes with an already normalized set.
	pub fn scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Normalizes and sets the requested scopes.
	pub fn try_scopes<I, S>(mut self, scopes: I) -> Result<Self, AuthRequestParamsError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = ScopeSet::new(scopes)?;

		Ok(self)
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the signing credential.
	pub fn credential(mut self, credential: CredentialSource) -> Self {
		self.credential = Some(credential);

		self
	}

	/// Signs with the PEM file at `path`, re-read on every signature.
	pub fn credential_file(self, path: impl Into<PathBuf>) -> Self {
		self.credential(CredentialSource::File(path.into()))
	}

	/// Signs with an in-memory PEM string.
	pub fn credential_pem(self, pem: impl Into<String>) -> Self {
		self.credential(CredentialSource::inline(pem))
	}

	/// Consumes the builder and validates the resulting parameters.
	pub fn build(self) -> Result<AuthRequestParams, AuthRequestParamsError> {
		let audience = self.audience.ok_or(AuthRequestParamsError::MissingAudience)?;
		let token_endpoint =
			self.token_endpoint.ok_or(AuthRequestParamsError::MissingTokenEndpoint)?;
		let credential = self.credential.ok_or(AuthRequestParamsError::MissingCredential)?;
		let params = AuthRequestParams {
			client_id: self.client_id,
			audience,
			subject: self.subject,
			scopes: self.scopes,
			token_endpoint,
			credential,
		};

		params.validate()?;

		Ok(params)
	}
}
impl TryFrom<AuthRequestParamsBuilder> for AuthRequestParams {
	type Error = AuthRequestParamsError;

	fn try_from(builder: AuthRequestParamsBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

impl AuthRequestParams {
	/// Validates invariants for the parameters.
	fn validate(&self) -> Result<(), AuthRequestParamsError> {
		if self.client_id.trim().is_empty() {
			return Err(AuthRequestParamsError::EmptyClientId);
		}
		if self.audience.trim().is_empty() {
			return Err(AuthRequestParamsError::EmptyAudience);
		}
		if self.subject.as_deref().is_some_and(|subject| subject.trim().is_empty()) {
			return Err(AuthRequestParamsError::EmptySubject);
		}

		validate_endpoint(&self.token_endpoint)
	}
}

fn validate_endpoint(url: &Url) -> Result<(), AuthRequestParamsError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(AuthRequestParamsError::UnsupportedEndpointScheme { url: url.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoint() -> Url {
		Url::parse("https://auth.example.com/oauth2/token")
			.expect("Token endpoint URL should parse.")
	}

	#[test]
	fn builds_valid_params() {
		let params = AuthRequestParams::builder("svc-client")
			.audience("https://auth.example.com")
			.subject("user-42")
			.try_scopes(["write", "read"])
			.expect("Scopes should normalize.")
			.token_endpoint(endpoint())
			.credential_file("/etc/keys/client.pem")
			.build()
			.expect("Params should build successfully.");

		assert_eq!(params.client_id, "svc-client");
		assert_eq!(params.subject.as_deref(), Some("user-42"));
		assert_eq!(params.scopes.normalized(), "write read");
		assert_eq!(params.credential, CredentialSource::File("/etc/keys/client.pem".into()));
	}

	#[test]
	fn rejects_missing_and_blank_fields() {
		let base = || {
			AuthRequestParams::builder("svc-client")
				.audience("aud")
				.token_endpoint(endpoint())
				.credential_pem("pem")
		};

		assert_eq!(
			AuthRequestParams::builder("svc-client")
				.token_endpoint(endpoint())
				.credential_pem("pem")
				.build(),
			Err(AuthRequestParamsError::MissingAudience)
		);
		assert_eq!(
			AuthRequestParams::builder(" ")
				.audience("aud")
				.token_endpoint(endpoint())
				.credential_pem("pem")
				.build(),
			Err(AuthRequestParamsError::EmptyClientId)
		);
		assert_eq!(base().audience("").build(), Err(AuthRequestParamsError::EmptyAudience));
		assert_eq!(base().subject("").build(), Err(AuthRequestParamsError::EmptySubject));
		assert_eq!(
			AuthRequestParams::builder("svc-client").audience("aud").credential_pem("pem").build(),
			Err(AuthRequestParamsError::MissingTokenEndpoint)
		);
		assert_eq!(
			AuthRequestParams::builder("svc-client")
				.audience("aud")
				.token_endpoint(endpoint())
				.build(),
			Err(AuthRequestParamsError::MissingCredential)
		);
	}

	#[test]
	fn rejects_non_http_endpoints() {
		let err = AuthRequestParams::builder("svc-client")
			.audience("aud")
			.token_endpoint(Url::parse("ftp://auth.example.com/token").expect("URL should parse."))
			.credential_pem("pem")
			.build()
			.expect_err("Non-HTTP endpoints must be rejected.");

		assert!(matches!(err, AuthRequestParamsError::UnsupportedEndpointScheme { .. }));
	}

	#[test]
	fn deserializes_through_validation() {
		let params: AuthRequestParams = serde_json::from_str(
			r#"{
				"client_id": "svc-client",
				"audience": "https://auth.example.com",
				"scopes": ["read"],
				"token_endpoint": "https://auth.example.com/oauth2/token",
				"credential": { "file": "/etc/keys/client.pem" }
			}"#,
		)
		.expect("Config should deserialize into params.");

		assert_eq!(params.subject, None);
		assert!(params.scopes.contains("read"));

		let err = serde_json::from_str::<AuthRequestParams>(
			r#"{
				"client_id": "svc-client",
				"token_endpoint": "https://auth.example.com/oauth2/token",
				"credential": { "inline": "pem" }
			}"#,
		)
		.expect_err("Config without an audience must be rejected.");

		assert!(err.to_string().contains("Missing assertion audience."));
	}
}
