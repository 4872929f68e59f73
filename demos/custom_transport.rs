//! Demonstrates plugging a non-reqwest transport into [`TokenExchangeClient`].
//!
//! 1. Implement [`TokenHttpClient`] and hand out a handle that owns whatever its request future
//!    needs.
//! 2. Pair it with [`DefaultTransportErrorMapper`], or a custom [`TransportErrorMapper`], so
//!    transport failures surface as crate errors.
//! 3. Pass both to [`TokenExchangeClient::with_http_client`].

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth2_jwt_bearer::{
	exchange::{
		DefaultTransportErrorMapper, JWT_BEARER_GRANT_TYPE, TokenExchangeClient,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode},
	},
	http::TokenHttpClient,
	params::AuthRequestParams,
};

const SERVICE_KEY: &str = include_str!("../tests/fixtures/rsa_private.pem");

type InProcessExchange = TokenExchangeClient<InProcessClient, DefaultTransportErrorMapper>;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let params = AuthRequestParams::builder("svc-router")
		.audience("https://auth.example.com/oauth2/token")
		.token_endpoint(Url::parse("https://auth.example.com/oauth2/token")?)
		.credential_pem(SERVICE_KEY)
		.build()?;
	let client = InProcessExchange::with_http_client(
		params.clone(),
		InProcessClient::Issue,
		DefaultTransportErrorMapper,
	)?;
	let token = client.fetch_token().await?;

	println!("Token issued by the in-process transport: {}.", token.expose());

	let rejecting = InProcessExchange::with_http_client(
		params.clone(),
		InProcessClient::Reject,
		DefaultTransportErrorMapper,
	)?;

	match rejecting.fetch_token().await {
		Ok(_) => println!("Rejecting transport unexpectedly issued a token."),
		Err(e) => println!("Authorization server error surfaced verbatim: {e}."),
	}

	let unreachable = InProcessExchange::with_http_client(
		params,
		InProcessClient::Unreachable,
		DefaultTransportErrorMapper,
	)?;

	match unreachable.fetch_token().await {
		Ok(_) => println!("Unreachable transport unexpectedly issued a token."),
		Err(e) => println!("Transport error mapped by the client: {e}."),
	}

	Ok(())
}

#[derive(Debug)]
struct ConnectionRefused;
impl Display for ConnectionRefused {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("connection refused by auth.example.com")
	}
}
impl StdError for ConnectionRefused {}

#[derive(Clone, Copy)]
enum InProcessClient {
	Issue,
	Reject,
	Unreachable,
}
impl TokenHttpClient for InProcessClient {
	type Handle = InProcessHandle;
	type TransportError = ConnectionRefused;

	fn handle(&self) -> Self::Handle {
		InProcessHandle(*self)
	}
}

struct InProcessHandle(InProcessClient);
impl<'a> AsyncHttpClient<'a> for InProcessHandle {
	type Error = HttpClientError<ConnectionRefused>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let behavior = self.0;

		Box::pin(async move {
			let body = String::from_utf8_lossy(request.body()).into_owned();
			let grant_ok = url::form_urlencoded::parse(body.as_bytes())
				.any(|(key, value)| key == "grant_type" && value == JWT_BEARER_GRANT_TYPE);

			match behavior {
				InProcessClient::Issue if grant_ok => Ok(HttpResponse::new(
					b"{\"access_token\":\"in-process-token\",\"expires_in\":600}".to_vec(),
				)),
				InProcessClient::Issue | InProcessClient::Reject => {
					let mut response = HttpResponse::new(
						b"{\"error\":\"invalid_client\",\"error_description\":\"unknown key\"}"
							.to_vec(),
					);

					*response.status_mut() = StatusCode::UNAUTHORIZED;

					Ok(response)
				},
				// `HttpClientError::Reqwest` carries any boxed transport error, not only reqwest's.
				InProcessClient::Unreachable =>
					Err(HttpClientError::Reqwest(Box::new(ConnectionRefused))),
			}
		})
	}
}
