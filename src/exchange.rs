//! JWT bearer token exchange against the authorization server.
//!
//! [`TokenExchangeClient::fetch_token`] signs a fresh assertion, posts it to the token
//! endpoint, and turns the response into an [`AccessToken`]. The body is read whatever the
//! status, so non-success responses surface verbatim inside [`AuthServerError`]. Nothing is
//! retried here.

pub use oauth2;

// crates.io
use oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	basic::BasicErrorResponse,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AccessTokenError},
	cache::{TokenFuture, TokenSource},
	clock::{Clock, SystemClock},
	error::{ArgumentError, AuthServerError, ResponseParseError, TransportError},
	http::{self, TokenHttpClient},
	jwt::{Assertion, AssertionBuilder},
	obs::{FlowKind, FlowSpan},
	params::AuthRequestParams,
	sign::SignatureProvider,
};
#[cfg(feature = "reqwest")]
use crate::http::ReqwestHttpClient;

/// Grant type sent with every exchange (RFC 7523 section 2.1).
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(&self, error: HttpClientError<E>) -> Error;
}

/// Mapper for custom transports; every transport-specific failure becomes a network error.
#[derive(Clone, Debug, Default)]
pub struct DefaultTransportErrorMapper;
impl<E> TransportErrorMapper<E> for DefaultTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, err: HttpClientError<E>) -> Error {
		map_http_client_error(err, |inner| TransportError::network(inner).into())
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: HttpClientError<ReqwestError>) -> Error {
		map_http_client_error(err, map_reqwest_error)
	}
}

#[cfg(feature = "reqwest")]
/// Exchange client specialized for the crate's default reqwest transport stack.
pub type ReqwestExchangeClient =
	TokenExchangeClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Exchanges signed assertions for access tokens.
///
/// The client owns its parameters, the signer derived from their credential, and the
/// transport. It keeps no token state; pair it with [`crate::cache::TokenCache`] to reuse
/// tokens across calls.
pub struct TokenExchangeClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	params: AuthRequestParams,
	signer: Arc<dyn SignatureProvider>,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	clock: Arc<dyn Clock>,
}
impl<C, M> TokenExchangeClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	///
	/// Inline credentials are parsed here; file credentials are read on every exchange.
	pub fn with_http_client(
		params: AuthRequestParams,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let signer = params.credential.signer()?;

		Ok(Self {
			params,
			signer,
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			clock: Arc::new(SystemClock),
		})
	}

	/// Replaces the signer derived from the configured credential.
	pub fn with_signer(mut self, signer: Arc<dyn SignatureProvider>) -> Self {
		self.signer = signer;

		self
	}

	/// Replaces the clock used to stamp assertions and compute expiry.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Parameters this client exchanges for.
	pub fn params(&self) -> &AuthRequestParams {
		&self.params
	}

	/// Performs one JWT bearer exchange.
	///
	/// The token lifetime is measured from the instant captured before the assertion is built.
	pub async fn fetch_token(&self) -> Result<AccessToken> {
		FlowSpan::new(FlowKind::Exchange, "fetch_token")
			.observe(async move {
				let issued_at = self.clock.now();
				let assertion =
					AssertionBuilder::new(&self.params, self.signer.as_ref()).build(issued_at)?;
				let request = self.token_request(&assertion)?;
				let handle = self.http_client.handle();
				let response = oauth2::AsyncHttpClient::call(&handle, request)
					.await
					.map_err(|err| self.transport_mapper.map_transport_error(err))?;

				map_token_response(&response, issued_at, self.clock.now())
			})
			.await
	}

	fn token_request(&self, assertion: &Assertion) -> Result<HttpRequest, ArgumentError> {
		let body = FormSerializer::new(String::new())
			.append_pair("grant_type", JWT_BEARER_GRANT_TYPE)
			.append_pair("assertion", assertion.as_str())
			.append_pair("client_id", &self.params.client_id)
			.finish();
		let request = Request::builder()
			.method(Method::POST)
			.uri(self.params.token_endpoint.as_str())
			.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
			.header(ACCEPT, JSON_CONTENT_TYPE)
			.body(body.into_bytes())?;

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl TokenExchangeClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by a reqwest transport that does not follow redirects.
	pub fn new(params: AuthRequestParams) -> Result<Self> {
		Self::with_http_client(
			params,
			ReqwestHttpClient::without_redirects()?,
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> TokenSource for TokenExchangeClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fetch_token(&self) -> TokenFuture<'_> {
		Box::pin(TokenExchangeClient::fetch_token(self))
	}
}
impl<C, M> Debug for TokenExchangeClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchangeClient").field("params", &self.params).finish()
	}
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	expires_in: i64,
}

fn map_token_response(
	response: &HttpResponse,
	issued_at: OffsetDateTime,
	received_at: OffsetDateTime,
) -> Result<AccessToken> {
	let status = response.status();

	if !status.is_success() {
		return Err(auth_server_error(response, received_at).into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let parsed: TokenEndpointResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ResponseParseError::json(source, status.as_u16()))?;

	if parsed.access_token.is_empty() {
		return Err(ResponseParseError::EmptyAccessToken.into());
	}
	if parsed.expires_in <= 0 {
		return Err(ResponseParseError::NonPositiveExpiresIn.into());
	}

	AccessToken::expiring_in(parsed.access_token, issued_at, Duration::seconds(parsed.expires_in))
		.map_err(|err| {
			match err {
				AccessTokenError::EmptyToken => ResponseParseError::EmptyAccessToken,
				AccessTokenError::NotInFuture => ResponseParseError::NonPositiveExpiresIn,
				AccessTokenError::LifetimeOutOfRange => ResponseParseError::ExpiresInOutOfRange,
			}
			.into()
		})
}

fn auth_server_error(response: &HttpResponse, received_at: OffsetDateTime) -> AuthServerError {
	let body = response.body();
	let oauth = serde_json::from_slice::<BasicErrorResponse>(body).ok();

	AuthServerError {
		status: response.status().as_u16(),
		body: String::from_utf8_lossy(body).into_owned(),
		oauth_error: oauth.as_ref().map(|err| err.error().as_ref().to_owned()),
		oauth_error_description: oauth.as_ref().and_then(|err| err.error_description().cloned()),
		retry_after: http::parse_retry_after(response.headers(), received_at),
	}
}

fn map_http_client_error<E>(err: HttpClientError<E>, map_inner: impl FnOnce(E) -> Error) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => map_inner(*inner),
		HttpClientError::Http(inner) => ArgumentError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::from(inner).into(),
		HttpClientError::Other(message) => TransportError::Other { message }.into(),
		_ => TransportError::Other { message: "unrecognized HTTP client failure".into() }.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ArgumentError::http_client_build(err).into();
	}
	if err.is_timeout() {
		return TransportError::timeout(err).into();
	}

	TransportError::network(err).into()
}
