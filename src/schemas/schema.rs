use schemars::schema::RootSchema;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};

use crate::types::Itinerary;

/// Name under which the itinerary schema is described to the model.
pub const ITINERARY_FUNCTION_NAME: &str = "generate_itinerary";

const ITINERARY_FUNCTION_DESCRIPTION: &str =
    "Generate a structured travel itinerary JSON using the prompt and image aesthetics";

/// Cached function-calling declaration derived from a Rust type.
///
/// The declaration is advisory: it is shown to the model inside the system
/// instruction, while the normalizer is what actually enforces the shape.
#[derive(Clone, Debug)]
pub struct FunctionSchema {
    name: &'static str,
    description: &'static str,
    parameters: Arc<Value>,
}

impl FunctionSchema {
    pub fn from_root_schema(
        name: &'static str,
        description: &'static str,
        root: RootSchema,
    ) -> Self {
        let mut parameters =
            serde_json::to_value(root).unwrap_or_else(|_| json!({ "type": "object" }));
        if let Some(object) = parameters.as_object_mut() {
            object.remove("$schema");
        }

        Self {
            name,
            description,
            parameters: Arc::new(parameters),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// JSON schema of the function parameters.
    pub fn parameters(&self) -> &Value {
        self.parameters.as_ref()
    }

    /// `{name, description, parameters}` object as used by function-calling APIs.
    pub fn declaration(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters.as_ref(),
        })
    }
}

/// The `generate_itinerary` declaration for [`Itinerary`].
pub fn itinerary_function() -> &'static FunctionSchema {
    static HANDLE: OnceLock<FunctionSchema> = OnceLock::new();
    HANDLE.get_or_init(|| {
        FunctionSchema::from_root_schema(
            ITINERARY_FUNCTION_NAME,
            ITINERARY_FUNCTION_DESCRIPTION,
            schemars::schema_for!(Itinerary),
        )
    })
}
