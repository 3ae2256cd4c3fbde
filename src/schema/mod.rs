pub mod extract;
pub mod validator;

pub use extract::FieldExtractor;
pub use validator::{ComplianceStatus, ObjectMatch, SchemaScanner, SchemaValidation};
