use std::collections::BTreeMap;

use common_http_errors::ApiError;

/// Server-side failures projected onto a form: per-field messages for the
/// fields the form renders, plus a summary line for everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    summary: Option<String>,
}

impl FormErrors {
    /// `known_fields` are the inputs the form displays. Field errors for other
    /// keys are folded into the summary so they are not lost.
    pub fn from_api_error(err: &ApiError, known_fields: &[&str]) -> Self {
        let mut form = FormErrors::default();
        let Some(errors) = err.field_errors() else {
            form.summary = Some(err.user_message());
            return form;
        };

        let mut unplaced = Vec::new();
        for (field, messages) in errors.iter() {
            let target = known_fields
                .iter()
                .find(|known| **known == field || field.starts_with(&format!("{known}.")));
            match target {
                Some(known) => form
                    .fields
                    .entry((*known).to_string())
                    .or_default()
                    .extend(messages.iter().cloned()),
                None => unplaced.extend(messages.iter().map(|m| format!("{field}: {m}"))),
            }
        }

        if let ApiError::Validation {
            message: Some(message),
            ..
        } = err
        {
            unplaced.insert(0, message.clone());
        }
        if !unplaced.is_empty() {
            form.summary = Some(unplaced.join("; "));
        }
        form
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.field(name)?.first().map(String::as_str)
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn has_field_errors(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.summary.is_none()
    }
}
