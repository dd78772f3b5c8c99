// crates/compliance-http/src/schema.rs
// ============================================================================
// Module: Schema Assertions
// Description: JSON-schema validation recorded as test failures.
// Purpose: Let checks assert response shapes against published schemas.
// Dependencies: compliance-core, jsonschema
// ============================================================================

//! ## Overview
//! Schemas are compiled as draft 2020-12. A schema that fails to compile is a
//! defect in the check itself and is reported as an unexpected error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use compliance_core::Failure;
use compliance_core::GenericFailure;
use compliance_core::TestResult;
use jsonschema::Draft;
use serde_json::Value;

// ============================================================================
// SECTION: Assertions
// ============================================================================

/// Validates `instance` against `schema`, recording `schema_mismatch` with
/// every validator message on failure. Returns true when the instance is valid.
pub fn assert_schema(result: &mut TestResult, schema: &Value, instance: &Value) -> bool {
    let validator = match jsonschema::options().with_draft(Draft::Draft202012).build(schema) {
        Ok(validator) => validator,
        Err(err) => {
            result.fail(Failure::unexpected(format!("failed to compile schema: {err}")));
            return false;
        }
    };
    let errors: Vec<String> = validator.iter_errors(instance).map(|err| err.to_string()).collect();
    if errors.is_empty() {
        return true;
    }
    result.fail_with(&GenericFailure::SchemaMismatch {
        errors,
    });
    false
}
