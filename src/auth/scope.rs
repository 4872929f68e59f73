//! Requested scopes and their `scope` claim rendering.

// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Ordered set of scopes requested in an assertion.
///
/// Entries keep the caller's order; repeated entries after the first are dropped. Configuration
/// may spell the set as a list (`["read", "write"]`) or as a space-delimited string
/// (`"read write"`).
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "ScopeInput", into = "Vec<String>")]
pub struct ScopeSet(Arc<[String]>);
impl ScopeSet {
	/// Validates `scopes`, keeping the first occurrence of each.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut entries = Vec::<String>::new();

		for scope in scopes {
			let scope = validate_entry(scope.into())?;

			if !entries.contains(&scope) {
				entries.push(scope);
			}
		}

		Ok(Self(entries.into()))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are requested.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if `scope` is part of the set.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.iter().any(|entry| entry == scope)
	}

	/// Iterates the scopes in request order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Space-delimited rendering of the set (RFC 6749 section 3.3).
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}

	/// Returns the `scope` claim value, or `None` when the set is empty.
	pub fn to_claim(&self) -> Option<String> {
		if self.is_empty() { None } else { Some(self.normalized()) }
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.iter()).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"" => Ok(Self::default()),
			s if s.trim().is_empty() => Err(ScopeValidationError::Empty),
			s => Self::new(s.split_whitespace()),
		}
	}
}
impl TryFrom<ScopeInput> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(input: ScopeInput) -> Result<Self, Self::Error> {
		match input {
			ScopeInput::List(scopes) => Self::new(scopes),
			ScopeInput::Delimited(scopes) => scopes.parse(),
		}
	}
}
impl From<ScopeSet> for Vec<String> {
	fn from(scopes: ScopeSet) -> Self {
		scopes.0.to_vec()
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScopeInput {
	List(Vec<String>),
	Delimited(String),
}

fn validate_entry(scope: String) -> Result<String, ScopeValidationError> {
	if scope.is_empty() {
		return Err(ScopeValidationError::Empty);
	}
	if scope.chars().any(char::is_whitespace) {
		return Err(ScopeValidationError::ContainsWhitespace { scope });
	}

	Ok(scope)
}
