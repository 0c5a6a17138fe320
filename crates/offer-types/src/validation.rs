//! Schema validation for provider configuration tables.
//!
//! Provider implementations receive their settings as a raw TOML table. Each
//! one describes the shape it expects with a [`Schema`] and checks the table
//! before building itself, so a typo in `config.toml` fails at startup instead
//! of silently producing fallback prices.

use thiserror::Error;

/// Errors that can occur while validating a configuration table.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is absent.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field is present but its value is not acceptable.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field holds a value of the wrong TOML type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	/// The table could not be turned into the implementation's config struct.
	#[error("Failed to deserialize config: {0}")]
	DeserializationError(String),
}

/// Expected TOML type of a field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer {
		/// Inclusive lower bound.
		min: Option<i64>,
		/// Inclusive upper bound.
		max: Option<i64>,
	},
	Boolean,
	/// Homogeneous array of the inner type.
	Array(Box<FieldType>),
	/// Nested table checked against its own schema.
	Table(Schema),
}

impl FieldType {
	fn name(&self) -> &'static str {
		match self {
			FieldType::String => "string",
			FieldType::Integer { .. } => "integer",
			FieldType::Boolean => "boolean",
			FieldType::Array(_) => "array",
			FieldType::Table(_) => "table",
		}
	}
}

/// Extra check run on a field after its type matched.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field of a schema.
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

	/// Attaches a custom check. The closure returns a message on failure.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, path: &str, value: &toml::Value) -> Result<(), ValidationError> {
		check_type(path, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: path.to_string(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields of a configuration table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates `config` against this schema.
	///
	/// Fails on the first missing required field, type mismatch or rejected
	/// custom check. Nested field paths are reported dotted, array elements
	/// with their index (e.g. `packages[1].display_price`).
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		self.validate_at("", config)
	}

	fn validate_at(&self, prefix: &str, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: if prefix.is_empty() {
					"root".to_string()
				} else {
					prefix.to_string()
				},
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let path = join_path(prefix, &field.name);
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(path.clone()))?;
			field.check(&path, value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(&join_path(prefix, &field.name), value)?;
			}
		}

		Ok(())
	}
}

fn join_path(prefix: &str, name: &str) -> String {
	if prefix.is_empty() {
		name.to_string()
	} else {
		format!("{}.{}", prefix, name)
	}
}

fn check_type(path: &str, value: &toml::Value, expected: &FieldType) -> Result<(), ValidationError> {
	let mismatch = || ValidationError::TypeMismatch {
		field: path.to_string(),
		expected: expected.name().to_string(),
		actual: value.type_str().to_string(),
	};

	match expected {
		FieldType::String if value.is_str() => Ok(()),
		FieldType::Boolean if value.is_bool() => Ok(()),
		FieldType::Integer { min, max } => {
			let n = value.as_integer().ok_or_else(mismatch)?;
			if let Some(min) = min {
				if n < *min {
					return Err(ValidationError::InvalidValue {
						field: path.to_string(),
						message: format!("Value {} is less than minimum {}", n, min),
					});
				}
			}
			if let Some(max) = max {
				if n > *max {
					return Err(ValidationError::InvalidValue {
						field: path.to_string(),
						message: format!("Value {} is greater than maximum {}", n, max),
					});
				}
			}
			Ok(())
		},
		FieldType::Array(inner) => {
			let items = value.as_array().ok_or_else(mismatch)?;
			for (i, item) in items.iter().enumerate() {
				check_type(&format!("{}[{}]", path, i), item, inner)?;
			}
			Ok(())
		},
		FieldType::Table(schema) => schema.validate_at(path, value),
		_ => Err(mismatch()),
	}
}

/// A configuration schema that can validate a TOML table.
///
/// Provider implementations return one from `config_schema()` so the loader
/// can check implementation tables without knowing their concrete type.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn package_schema() -> Schema {
		Schema::new(
			vec![
				Field::new("identifier", FieldType::String),
				Field::new("display_price", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some(s) if !s.trim().is_empty() => Ok(()),
						_ => Err("display_price cannot be empty".to_string()),
					}
				}),
			],
			vec![],
		)
	}

	fn offer_schema() -> Schema {
		Schema::new(
			vec![Field::new(
				"packages",
				FieldType::Array(Box::new(FieldType::Table(package_schema()))),
			)],
			vec![
				Field::new("available", FieldType::Boolean),
				Field::new(
					"latency_ms",
					FieldType::Integer {
						min: Some(0),
						max: Some(10_000),
					},
				),
			],
		)
	}

	#[test]
	fn test_valid_table() {
		let config: toml::Value = toml::from_str(
			r#"
available = true
latency_ms = 20
packages = [{ identifier = "$rc_monthly", display_price = "$4.99" }]
"#,
		)
		.unwrap();

		assert!(offer_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let config: toml::Value = toml::from_str("available = true").unwrap();

		let err = offer_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(ref f) if f == "packages"));
	}

	#[test]
	fn test_nested_path_in_errors() {
		let config: toml::Value = toml::from_str(
			r#"
packages = [
  { identifier = "$rc_annual", display_price = "$39.99" },
  { identifier = "$rc_monthly", display_price = " " },
]
"#,
		)
		.unwrap();

		let err = offer_schema().validate(&config).unwrap_err();
		match err {
			ValidationError::InvalidValue { field, message } => {
				assert_eq!(field, "packages[1].display_price");
				assert!(message.contains("cannot be empty"));
			},
			other => panic!("unexpected error: {}", other),
		}
	}

	#[test]
	fn test_type_mismatch_and_bounds() {
		let config: toml::Value = toml::from_str(
			r#"
available = "yes"
packages = []
"#,
		)
		.unwrap();
		let err = offer_schema().validate(&config).unwrap_err();
		assert!(matches!(
			err,
			ValidationError::TypeMismatch { ref field, ref expected, .. }
				if field == "available" && expected == "boolean"
		));

		let config: toml::Value = toml::from_str(
			r#"
latency_ms = 20000
packages = []
"#,
		)
		.unwrap();
		let err = offer_schema().validate(&config).unwrap_err();
		assert!(err.to_string().contains("greater than maximum"));
	}
}
