//! RS256 signature providers backed by PEM-encoded RSA private keys.
//!
//! [`SignatureProvider`] is the only seam the assertion builder depends on. File-backed keys
//! are re-read on every signature so on-disk rotation takes effect without a restart; inline
//! keys are parsed once when the signer is built.

// std
use std::fs;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, crypto};
// self
use crate::{_prelude::*, auth::TokenSecret, error::CredentialError};

const PEM_BEGIN: &str = "-----BEGIN ";
const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY-----";

/// Produces RSASSA-PKCS1-v1_5 SHA-256 signatures over arbitrary bytes.
pub trait SignatureProvider
where
	Self: Send + Sync,
{
	/// Signs `message` and returns the raw signature bytes.
	fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CredentialError>;
}

/// Where the signing key comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
	/// PEM file on disk, read on every signature.
	File(PathBuf),
	/// PEM text held in memory.
	Inline(TokenSecret),
}
impl CredentialSource {
	/// Wraps in-memory PEM text.
	pub fn inline(pem: impl Into<String>) -> Self {
		Self::Inline(TokenSecret::new(pem))
	}

	/// Builds the signer for this source.
	///
	/// Inline PEM is parsed here, so malformed material fails fast; file sources defer all I/O
	/// to [`SignatureProvider::sign`].
	pub fn signer(&self) -> Result<Arc<dyn SignatureProvider>, CredentialError> {
		match self {
			Self::File(path) => Ok(Arc::new(FilePemSigner::new(path.clone()))),
			Self::Inline(pem) => Ok(Arc::new(InlinePemSigner::new(pem.expose())?)),
		}
	}
}

/// Signs with a PEM file that is loaded on every call.
#[derive(Clone, Debug)]
pub struct FilePemSigner {
	path: PathBuf,
}
impl FilePemSigner {
	/// Creates a signer for the PEM file at `path`.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Path of the PEM file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load(&self) -> Result<EncodingKey, CredentialError> {
		let pem = fs::read_to_string(&self.path)
			.map_err(|source| CredentialError::read(&self.path, source))?;

		parse_rsa_pem(&pem)
	}
}
impl SignatureProvider for FilePemSigner {
	fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CredentialError> {
		sign_rs256(&self.load()?, message)
	}
}

/// Signs with an RSA key parsed once from in-memory PEM text.
#[derive(Clone)]
pub struct InlinePemSigner {
	key: EncodingKey,
}
impl InlinePemSigner {
	/// Parses `pem` into a signing key.
	pub fn new(pem: &str) -> Result<Self, CredentialError> {
		Ok(Self { key: parse_rsa_pem(pem)? })
	}
}
impl SignatureProvider for InlinePemSigner {
	fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CredentialError> {
		sign_rs256(&self.key, message)
	}
}
impl Debug for InlinePemSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("InlinePemSigner").field("key", &"<redacted>").finish()
	}
}

fn parse_rsa_pem(pem: &str) -> Result<EncodingKey, CredentialError> {
	if !pem.contains(PEM_BEGIN) {
		return Err(CredentialError::MalformedPem);
	}
	if !pem.contains(PRIVATE_KEY_LABEL) {
		return Err(CredentialError::MissingPrivateKey);
	}

	EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(CredentialError::invalid_key)
}

fn sign_rs256(key: &EncodingKey, message: &[u8]) -> Result<Vec<u8>, CredentialError> {
	// `crypto::sign` hands back the signature already base64url-encoded.
	let encoded = crypto::sign(message, key, Algorithm::RS256).map_err(CredentialError::signing)?;

	URL_SAFE_NO_PAD
		.decode(encoded)
		.map_err(|source| CredentialError::SignatureEncoding { source })
}

#[cfg(test)]
mod tests {
	// std
	use std::io::Write;
	// crates.io
	use jsonwebtoken::DecodingKey;
	use tempfile::NamedTempFile;
	// self
	use super::*;

	const RSA_PRIVATE: &str = include_str!("../tests/fixtures/rsa_private.pem");
	const RSA_PUBLIC: &str = include_str!("../tests/fixtures/rsa_public.pem");
	const EC_PRIVATE: &str = include_str!("../tests/fixtures/ec_private.pem");

	fn verify(signature: &[u8], message: &[u8]) -> bool {
		let key = DecodingKey::from_rsa_pem(RSA_PUBLIC.as_bytes())
			.expect("Public key fixture should parse.");

		crypto::verify(&URL_SAFE_NO_PAD.encode(signature), message, &key, Algorithm::RS256)
			.expect("Verification should run.")
	}

	#[test]
	fn inline_signature_verifies_with_public_key() {
		let signer = InlinePemSigner::new(RSA_PRIVATE).expect("RSA fixture should parse.");
		let signature = signer.sign(b"header.payload").expect("Signing should succeed.");

		assert_eq!(signature.len(), 256, "RSA-2048 signatures are 256 bytes.");
		assert!(verify(&signature, b"header.payload"));
		assert!(!verify(&signature, b"header.tampered"));
	}

	#[test]
	fn file_signer_rereads_the_pem_on_every_call() {
		let mut file = NamedTempFile::new().expect("Temp file should be created.");

		file.write_all(b"not a key").expect("Temp file should be writable.");

		let signer = FilePemSigner::new(file.path());

		assert!(matches!(signer.sign(b"msg"), Err(CredentialError::MalformedPem)));

		fs::write(file.path(), RSA_PRIVATE).expect("Temp file should be rewritable.");

		let signature = signer.sign(b"msg").expect("Signing should succeed after rotation.");

		assert!(verify(&signature, b"msg"));
	}

	#[test]
	fn missing_file_is_a_read_error() {
		let signer = FilePemSigner::new("/nonexistent/oauth2-jwt-bearer/key.pem");
		let err = signer.sign(b"msg").expect_err("Missing files must fail.");

		assert!(matches!(err, CredentialError::Read { .. }));
		assert!(err.to_string().contains("/nonexistent/oauth2-jwt-bearer/key.pem"));
	}

	#[test]
	fn rejects_keys_that_cannot_sign() {
		assert!(matches!(
			InlinePemSigner::new(RSA_PUBLIC),
			Err(CredentialError::MissingPrivateKey)
		));
		assert!(matches!(InlinePemSigner::new(EC_PRIVATE), Err(CredentialError::InvalidKey { .. })));
		assert!(matches!(InlinePemSigner::new("garbage"), Err(CredentialError::MalformedPem)));
	}

	#[test]
	fn credential_source_builds_signers() {
		let inline = CredentialSource::inline(RSA_PRIVATE);
		let signer = inline.signer().expect("Inline RSA fixture should build a signer.");

		assert!(verify(&signer.sign(b"msg").expect("Signing should succeed."), b"msg"));
		assert!(
			CredentialSource::File("/nonexistent.pem".into()).signer().is_ok(),
			"File sources defer I/O until signing."
		);
		assert!(!format!("{inline:?}").contains("PRIVATE KEY"));
	}
}
