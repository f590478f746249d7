//! Form, visualization, workflow, and schema metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use digit_auth::SessionCookie;

use crate::errors::ApiError;
use crate::rest::RestApi;

/// Element kinds a form definition can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormElementType {
    /// A group of fields.
    #[serde(rename = "FormFieldset")]
    FieldGroup,
    /// A link to another object.
    #[serde(rename = "FormLink")]
    Link,
    /// A data table.
    #[serde(rename = "FormGrid")]
    Table,
}

impl FormElementType {
    /// The wire name of this element kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FieldGroup => "FormFieldset",
            Self::Link => "FormLink",
            Self::Table => "FormGrid",
        }
    }

    /// Parse a wire name; unknown names are `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "FormFieldset" => Some(Self::FieldGroup),
            "FormLink" => Some(Self::Link),
            "FormGrid" => Some(Self::Table),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct FormsEnvelope {
    forms: Vec<Value>,
}

#[derive(Deserialize)]
struct WorkflowsEnvelope {
    workflows: Vec<Value>,
}

impl RestApi {
    /// List the available forms.
    pub async fn get_forms(&self, cookie: &SessionCookie) -> Result<Vec<Value>, ApiError> {
        let body = self.http.get_json(cookie, "rest/forms").await?;
        let envelope: FormsEnvelope = serde_json::from_value(body)?;
        Ok(envelope.forms)
    }

    /// Fetch one form definition.
    pub async fn get_form_data(
        &self,
        cookie: &SessionCookie,
        form_object_id: &str,
    ) -> Result<Value, ApiError> {
        if form_object_id.trim().is_empty() {
            return Err(ApiError::invalid_input("formObjectId must not be empty"));
        }
        self.http
            .get_json(cookie, &format!("rest/form/{form_object_id}"))
            .await
    }

    /// List the available visualizations.
    pub async fn get_vises(&self, cookie: &SessionCookie) -> Result<Value, ApiError> {
        self.http.get_json(cookie, "rest/vis").await
    }

    /// Fetch one visualization definition.
    pub async fn get_vis_data(
        &self,
        cookie: &SessionCookie,
        vis_object_id: &str,
    ) -> Result<Value, ApiError> {
        if vis_object_id.trim().is_empty() {
            return Err(ApiError::invalid_input("visObjectId must not be empty"));
        }
        self.http
            .get_json(cookie, &format!("rest/vis/{vis_object_id}"))
            .await
    }

    /// List the available workflows.
    pub async fn get_workflows(&self, cookie: &SessionCookie) -> Result<Vec<Value>, ApiError> {
        let body = self.http.get_json(cookie, "rest/workflow").await?;
        let envelope: WorkflowsEnvelope = serde_json::from_value(body)?;
        Ok(envelope.workflows)
    }

    /// Fetch the entity schema.
    pub async fn get_uml_schema(&self, cookie: &SessionCookie) -> Result<Value, ApiError> {
        self.http.get_json(cookie, "rest/entityspec").await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_type_wire_names() {
        assert_eq!(FormElementType::FieldGroup.as_str(), "FormFieldset");
        assert_eq!(FormElementType::Link.as_str(), "FormLink");
        assert_eq!(FormElementType::Table.as_str(), "FormGrid");
    }

    #[test]
    fn element_type_from_wire_roundtrip() {
        for kind in [
            FormElementType::FieldGroup,
            FormElementType::Link,
            FormElementType::Table,
        ] {
            assert_eq!(FormElementType::from_wire(kind.as_str()), Some(kind));
        }
        assert_eq!(FormElementType::from_wire("FormSurprise"), None);
    }

    #[test]
    fn element_type_serde_uses_wire_names() {
        let json = serde_json::to_string(&FormElementType::Table).unwrap();
        assert_eq!(json, "\"FormGrid\"");
        let back: FormElementType = serde_json::from_str("\"FormLink\"").unwrap();
        assert_eq!(back, FormElementType::Link);
    }
}
