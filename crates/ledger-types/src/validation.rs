//! Configuration validation for backend-specific tables.
//!
//! Node and wallet backends receive their `implementations.<name>` table as a
//! raw TOML value. Each backend describes the table with a `Schema` and
//! validates it before construction, so a missing key or a malformed address
//! fails at startup instead of on the first request.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// The type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// An integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// An http:// or https:// endpoint.
	HttpUrl,
}

/// Custom check run after the type check passes.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// Required and optional fields of a TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Required fields must be present; optional fields are checked only when
	/// present. Unknown keys are ignored.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			check_field(field, value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				check_field(field, value)?;
			}
		}

		Ok(())
	}
}

fn check_field(field: &Field, value: &toml::Value) -> Result<(), ValidationError> {
	validate_field_type(&field.name, value, &field.field_type)?;
	if let Some(validator) = &field.validator {
		validator(value).map_err(|message| ValidationError::InvalidValue {
			field: field.name.clone(),
			message,
		})?;
	}
	Ok(())
}

fn mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn invalid(field_name: &str, message: String) -> ValidationError {
	ValidationError::InvalidValue {
		field: field_name.to_string(),
		message,
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	if let FieldType::Integer { min, max } = expected_type {
		let n = value
			.as_integer()
			.ok_or_else(|| mismatch(field_name, "integer", value))?;
		if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
			return Err(invalid(
				field_name,
				format!("Value {} is outside {:?}..={:?}", n, min, max),
			));
		}
		return Ok(());
	}

	let text = value
		.as_str()
		.ok_or_else(|| mismatch(field_name, "string", value))?;
	match expected_type {
		FieldType::HttpUrl if !(text.starts_with("http://") || text.starts_with("https://")) => {
			Err(invalid(field_name, format!("'{}' is not an http(s) URL", text)))
		},
		_ => Ok(()),
	}
}

/// A configuration schema a backend exposes for its own table.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(
			vec![Field::new("rpc_url", FieldType::HttpUrl)],
			vec![
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
				Field::new("label", FieldType::String),
			],
		)
	}

	#[test]
	fn test_missing_required_field() {
		let value: toml::Value = toml::from_str("timeout_seconds = 5").unwrap();
		let err = schema().validate(&value).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "rpc_url"));
	}

	#[test]
	fn test_rpc_url_must_be_http() {
		let value: toml::Value = toml::from_str("rpc_url = \"ws://localhost:8546\"").unwrap();
		assert!(matches!(
			schema().validate(&value),
			Err(ValidationError::InvalidValue { field, .. }) if field == "rpc_url"
		));

		let value: toml::Value = toml::from_str("rpc_url = 8545").unwrap();
		assert!(matches!(
			schema().validate(&value),
			Err(ValidationError::TypeMismatch { .. })
		));
	}

	#[test]
	fn test_integer_bounds_and_optional_fields() {
		let value: toml::Value =
			toml::from_str("rpc_url = \"http://localhost:8545\"\ntimeout_seconds = 0").unwrap();
		assert!(matches!(
			schema().validate(&value),
			Err(ValidationError::InvalidValue { .. })
		));

		let value: toml::Value =
			toml::from_str("rpc_url = \"http://localhost:8545\"\nlabel = 3").unwrap();
		assert!(matches!(
			schema().validate(&value),
			Err(ValidationError::TypeMismatch { field, .. }) if field == "label"
		));

		let value: toml::Value = toml::from_str(
			"rpc_url = \"http://localhost:8545\"\ntimeout_seconds = 30\nlabel = \"dev\"",
		)
		.unwrap();
		assert!(schema().validate(&value).is_ok());
	}
}
