//! Crate-level error types shared by signing, exchange, and caching.
//!
//! Every error is [`Clone`] so a single failed fetch can be handed to every caller that waited
//! on it. Sources that are not cloneable themselves are shared behind an [`Arc`].

// std
use std::io::Error as IoError;
// crates.io
use jsonwebtoken::errors::Error as JwtError;
// self
use crate::{
	_prelude::*,
	auth::{AccessTokenError, ScopeValidationError},
	params::AuthRequestParamsError,
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// The PEM credential could not be read, parsed, or used to sign.
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Authorization server answered with a non-success status.
	#[error(transparent)]
	AuthServer(#[from] AuthServerError),
	/// Success response body was malformed or incomplete.
	#[error(transparent)]
	ResponseParse(#[from] ResponseParseError),
	/// Caller supplied an invalid value or misused an API.
	#[error(transparent)]
	InvalidArgument(#[from] ArgumentError),
}
impl Error {
	/// Returns the HTTP status reported by the authorization server, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::AuthServer(err) => Some(err.status),
			Self::ResponseParse(ResponseParseError::Json { status, .. }) => Some(*status),
			_ => None,
		}
	}
}
impl From<ScopeValidationError> for Error {
	fn from(e: ScopeValidationError) -> Self {
		ArgumentError::from(e).into()
	}
}
impl From<AuthRequestParamsError> for Error {
	fn from(e: AuthRequestParamsError) -> Self {
		ArgumentError::from(e).into()
	}
}
impl From<AccessTokenError> for Error {
	fn from(e: AccessTokenError) -> Self {
		ArgumentError::from(e).into()
	}
}

/// Failures raised while loading a PEM credential or producing a signature.
#[derive(Clone, Debug, ThisError)]
pub enum CredentialError {
	/// PEM file could not be read from disk.
	#[error("Unable to read PEM credential from {}.", .path.display())]
	Read {
		/// Path that failed to load.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: Arc<IoError>,
	},
	/// Input does not contain a PEM block.
	#[error("Credential is not PEM encoded.")]
	MalformedPem,
	/// PEM does not contain a private key block.
	#[error("PEM credential does not contain a private key.")]
	MissingPrivateKey,
	/// PEM private key is not a usable RSA key.
	#[error("PEM credential is not a valid RSA private key.")]
	InvalidKey {
		/// Key parsing failure.
		#[source]
		source: Arc<JwtError>,
	},
	/// The RSA signing primitive failed.
	#[error("RS256 signing failed.")]
	Signing {
		/// Signing failure.
		#[source]
		source: Arc<JwtError>,
	},
	/// The signature could not be decoded into raw bytes.
	#[error("Signature could not be decoded.")]
	SignatureEncoding {
		/// Decoding failure.
		#[source]
		source: base64::DecodeError,
	},
}
impl CredentialError {
	pub(crate) fn read(path: &Path, source: IoError) -> Self {
		Self::Read { path: path.to_path_buf(), source: Arc::new(source) }
	}

	pub(crate) fn invalid_key(source: JwtError) -> Self {
		Self::InvalidKey { source: Arc::new(source) }
	}

	pub(crate) fn signing(source: JwtError) -> Self {
		Self::Signing { source: Arc::new(source) }
	}
}

/// Transport-level failures (network, I/O).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Request did not complete in time.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: SharedError,
	},
	/// Underlying I/O failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io {
		/// I/O failure.
		#[source]
		source: Arc<IoError>,
	},
	/// Transport reported a failure that carries only a message.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Arc::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Timeout { source: Arc::new(src) }
	}
}
impl From<IoError> for TransportError {
	fn from(e: IoError) -> Self {
		Self::Io { source: Arc::new(e) }
	}
}

/// Non-success response returned by the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Token endpoint responded with HTTP {status}: {body}")]
pub struct AuthServerError {
	/// HTTP status code.
	pub status: u16,
	/// Response body, verbatim (lossy UTF-8).
	pub body: String,
	/// RFC 6749 `error` code when the body is an OAuth error object.
	pub oauth_error: Option<String>,
	/// RFC 6749 `error_description` when present.
	pub oauth_error_description: Option<String>,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}

/// Failures decoding a success response from the token endpoint.
#[derive(Clone, Debug, ThisError)]
pub enum ResponseParseError {
	/// Body is not JSON or lacks a required field.
	#[error("Token endpoint returned malformed JSON.")]
	Json {
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// `access_token` was present but empty.
	#[error("Token endpoint returned an empty access_token.")]
	EmptyAccessToken,
	/// `expires_in` was zero or negative.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// `expires_in` overflows the supported time range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}
impl ResponseParseError {
	pub(crate) fn json(source: serde_path_to_error::Error<serde_json::Error>, status: u16) -> Self {
		Self::Json { source: Arc::new(source), status }
	}
}

/// Invalid input or API misuse.
#[derive(Clone, Debug, ThisError)]
pub enum ArgumentError {
	/// base64url encoding was asked to encode nothing.
	#[error("Cannot base64url-encode an empty byte sequence.")]
	EmptyEncodingInput,
	/// JWT segment could not be serialized.
	#[error("JWT segment could not be serialized.")]
	Serialization {
		/// Serialization failure.
		#[source]
		source: Arc<serde_json::Error>,
	},
	/// Request parameters failed validation.
	#[error(transparent)]
	Params(#[from] AuthRequestParamsError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] ScopeValidationError),
	/// Access token value failed validation.
	#[error(transparent)]
	AccessToken(#[from] AccessTokenError),
	/// HTTP request construction failed.
	#[error("HTTP request could not be constructed.")]
	HttpRequest {
		/// Request builder failure.
		#[source]
		source: Arc<oauth2::http::Error>,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// Expiry scheduling requires a Tokio runtime context.
	#[error("A Tokio runtime is required to schedule token expiry.")]
	RuntimeUnavailable,
}
impl ArgumentError {
	/// Wraps a transport's builder failure inside [`ArgumentError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}

	pub(crate) fn serialization(source: serde_json::Error) -> Self {
		Self::Serialization { source: Arc::new(source) }
	}
}
impl From<oauth2::http::Error> for ArgumentError {
	fn from(e: oauth2::http::Error) -> Self {
		Self::HttpRequest { source: Arc::new(e) }
	}
}
