//! Demonstrates exchanging a signed JWT assertion for a service token with the default reqwest
//! transport, then sharing that token through a [`TokenCache`].
//!
//! The token endpoint is an in-process mock; concurrent retrievals hit it exactly once.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_jwt_bearer::{
	cache::TokenCache, exchange::ReqwestExchangeClient, params::AuthRequestParams,
};

const SERVICE_KEY: &str = include_str!("../tests/fixtures/rsa_private.pem");

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.header("accept", "application/json")
				.body_includes("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-service-token\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let params = AuthRequestParams::builder("svc-router")
		.audience("https://auth.example.com/oauth2/token")
		.subject("svc-router@tenants.example.com")
		.try_scopes(["inventory.read", "orders.write"])?
		.token_endpoint(Url::parse(&server.url("/oauth2/token"))?)
		.credential_pem(SERVICE_KEY)
		.build()?;
	let cache = Arc::new(TokenCache::new(ReqwestExchangeClient::new(params)?));
	let (first, second) = tokio::try_join!(cache.retrieve(), cache.retrieve())?;

	println!("Service token: {}.", first.expose());
	println!("Expires at: {}.", first.expires_at());
	println!("Both callers share one token: {}.", Arc::ptr_eq(&first, &second));

	let again = cache.retrieve().await?;

	println!("Cache hits so far: {}.", cache.metrics().hits());
	println!("Authorization: {}.", again.authorization_header());

	token_mock.assert_calls_async(1).await;

	Ok(())
}
