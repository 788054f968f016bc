//! Built-in search parameter dictionary.
//!
//! Used when no dictionary file is configured. Covers `Condition` plus a few
//! resource types that together exercise every path shape.

use crate::parameters::{PathShape, SearchParamInfo, SearchParameterType};
use crate::registry::SearchParameterDictionary;

fn scalar(primitive: &str) -> PathShape {
    PathShape::Scalar(primitive.to_string())
}

/// Build the built-in dictionary.
pub fn builtin_dictionary() -> SearchParameterDictionary {
    let dictionary = SearchParameterDictionary::new();
    register_builtin_parameters(&dictionary);
    dictionary
}

/// Register the built-in parameters into an existing dictionary.
pub fn register_builtin_parameters(dictionary: &SearchParameterDictionary) {
    use SearchParameterType::*;

    // _id is matched as an exact string on every resource type
    for resource_type in ["Condition", "Encounter", "Observation", "Patient", "RiskAssessment"] {
        dictionary.register(
            resource_type,
            SearchParamInfo::new("_id", String).with_path("_id", scalar("string")),
        );
    }

    dictionary.register(
        "Condition",
        SearchParamInfo::new("code", Token).with_path("code", PathShape::CodeableConcept),
    );
    dictionary.register(
        "Condition",
        SearchParamInfo::new("patient", Reference).with_path("patient", PathShape::Reference),
    );
    dictionary.register(
        "Condition",
        SearchParamInfo::new("onset-date", Date).with_path("onsetDateTime", scalar("dateTime")),
    );

    dictionary.register(
        "Patient",
        SearchParamInfo::new("identifier", Token).with_path("identifier", PathShape::Identifier),
    );
    dictionary.register(
        "Patient",
        SearchParamInfo::new("telecom", Token).with_path("telecom", PathShape::ContactPoint),
    );
    dictionary.register(
        "Patient",
        SearchParamInfo::new("gender", Token).with_path("gender", scalar("code")),
    );
    dictionary.register(
        "Patient",
        SearchParamInfo::new("active", Token).with_path("active", scalar("boolean")),
    );
    dictionary.register(
        "Patient",
        SearchParamInfo::new("name", String)
            .with_path("name.family", scalar("string"))
            .with_path("name.given", scalar("string")),
    );
    dictionary.register(
        "Patient",
        SearchParamInfo::new("birthdate", Date).with_path("birthDate", scalar("date")),
    );

    dictionary.register(
        "Observation",
        SearchParamInfo::new("code", Token).with_path("code", PathShape::CodeableConcept),
    );
    dictionary.register(
        "Observation",
        SearchParamInfo::new("subject", Reference).with_path("subject", PathShape::Reference),
    );
    dictionary.register(
        "Observation",
        SearchParamInfo::new("patient", Reference).with_path("subject", PathShape::Reference),
    );
    dictionary.register(
        "Observation",
        SearchParamInfo::new("value-quantity", Quantity)
            .with_path("valueQuantity", PathShape::Quantity),
    );
    dictionary.register(
        "Observation",
        SearchParamInfo::new("date", Date).with_path("effectiveDateTime", scalar("dateTime")),
    );
    dictionary.register(
        "Observation",
        SearchParamInfo::new("_profile", Uri).with_path("meta.profile", scalar("canonical")),
    );
    dictionary.register(
        "Observation",
        SearchParamInfo::new("code-value-quantity", Composite)
            .with_path("code", PathShape::CodeableConcept)
            .with_path("valueQuantity", PathShape::Quantity),
    );

    dictionary.register(
        "Encounter",
        SearchParamInfo::new("class", Token).with_path("class", PathShape::Coding),
    );
    dictionary.register(
        "Encounter",
        SearchParamInfo::new("type", Token).with_path("type", PathShape::CodeableConcept),
    );
    dictionary.register(
        "Encounter",
        SearchParamInfo::new("patient", Reference).with_path("patient", PathShape::Reference),
    );
    dictionary.register(
        "Encounter",
        SearchParamInfo::new("date", Date).with_path("period.start", scalar("dateTime")),
    );

    dictionary.register(
        "RiskAssessment",
        SearchParamInfo::new("probability", Number)
            .with_path("prediction.probabilityDecimal", scalar("decimal")),
    );
}
