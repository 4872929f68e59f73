//! JWT bearer assertions (RFC 7523) signed with RS256.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, error::ArgumentError, params::AuthRequestParams, sign::SignatureProvider};

/// How long an assertion stays valid after it is built.
pub const ASSERTION_LIFETIME: Duration = Duration::seconds(60);

/// Encodes bytes as base64url without padding.
///
/// Empty input is rejected because every JWT segment must carry content.
pub fn base64url_encode(bytes: &[u8]) -> Result<String, ArgumentError> {
	if bytes.is_empty() {
		return Err(ArgumentError::EmptyEncodingInput);
	}

	Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// JOSE header; always RS256.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionHeader {
	/// Signing algorithm.
	pub alg: String,
	/// Token type.
	pub typ: String,
}
impl Default for AssertionHeader {
	fn default() -> Self {
		Self { alg: "RS256".into(), typ: "JWT".into() }
	}
}

/// Assertion payload; absent optional claims are omitted rather than serialized as `null`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Issuer: the OAuth client identifier.
	pub iss: String,
	/// Audience: the authorization server.
	pub aud: String,
	/// Expiry as Unix seconds.
	pub exp: i64,
	/// Space-delimited scopes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Subject being acted for.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
}
impl AssertionClaims {
	/// Derives the claims for `params` at `now`.
	pub fn new(params: &AuthRequestParams, now: OffsetDateTime) -> Self {
		Self {
			iss: params.client_id.clone(),
			aud: params.audience.clone(),
			exp: (now + ASSERTION_LIFETIME).unix_timestamp(),
			scope: params.scopes.to_claim(),
			sub: params.subject.clone(),
		}
	}
}

/// Compact, signed JWT. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Assertion(String);
impl Assertion {
	/// Returns the compact serialization. Callers must avoid logging this string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Consumes the assertion and returns the compact serialization.
	pub fn into_string(self) -> String {
		self.0
	}
}
impl Debug for Assertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Assertion").field(&"<redacted>").finish()
	}
}

/// Builds signed assertions for one set of request parameters.
pub struct AssertionBuilder<'a> {
	params: &'a AuthRequestParams,
	signer: &'a dyn SignatureProvider,
}
impl<'a> AssertionBuilder<'a> {
	/// Creates a builder over borrowed parameters and signer.
	pub fn new(params: &'a AuthRequestParams, signer: &'a dyn SignatureProvider) -> Self {
		Self { params, signer }
	}

	/// Builds and signs an assertion stamped at `now`.
	pub fn build(&self, now: OffsetDateTime) -> Result<Assertion> {
		let header = encode_segment(&AssertionHeader::default())?;
		let claims = encode_segment(&AssertionClaims::new(self.params, now))?;
		let signing_input = format!("{header}.{claims}");
		let signature = self.signer.sign(signing_input.as_bytes())?;
		let signature = base64url_encode(&signature)?;

		Ok(Assertion(format!("{signing_input}.{signature}")))
	}
}
impl Debug for AssertionBuilder<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AssertionBuilder").field("params", self.params).finish_non_exhaustive()
	}
}

fn encode_segment<T>(value: &T) -> Result<String, ArgumentError>
where
	T: Serialize,
{
	let json = serde_json::to_vec(value).map_err(ArgumentError::serialization)?;

	base64url_encode(&json)
}
