use serde_json::Value;

/// The closed set of form field kinds a tool schema can describe. Anything
/// outside it renders as an explicit placeholder instead of being
/// interpreted dynamically.
#[derive(Clone, PartialEq, Debug)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Choice(Vec<String>),
    Unsupported(String),
}

#[derive(Clone, PartialEq, Debug)]
pub struct ToolField {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub kind: FieldKind,
}

/// Reads the `properties` of a JSON-schema string into form fields. An
/// empty or property-less schema yields no fields (the tool takes no
/// parameters).
pub fn parse_fields(raw: &str) -> Result<Vec<ToolField>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let schema: Value = serde_json::from_str(raw)?;
    let properties = match schema.get("properties").and_then(Value::as_object) {
        Some(properties) => properties,
        None => return Ok(Vec::new()),
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut fields = Vec::with_capacity(properties.len());
    for (name, prop) in properties {
        let title = prop
            .get("title")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| format_title(name));
        let description = prop
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);
        fields.push(ToolField {
            name: name.clone(),
            title,
            description,
            required: required.contains(&name.as_str()),
            kind: field_kind(prop),
        });
    }
    Ok(fields)
}

fn field_kind(prop: &Value) -> FieldKind {
    if let Some(options) = prop.get("enum").and_then(Value::as_array) {
        return FieldKind::Choice(
            options
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
        );
    }
    match prop.get("type").and_then(Value::as_str) {
        Some("string") => FieldKind::Text,
        Some("number") | Some("integer") => FieldKind::Number,
        Some("boolean") => FieldKind::Bool,
        other => FieldKind::Unsupported(other.unwrap_or("unknown").to_string()),
    }
}

/// Tools without input fields run as agents straight from the chat; tools
/// with fields get the generated form.
pub fn has_inputs(raw: &str) -> bool {
    match parse_fields(raw) {
        Ok(fields) => !fields.is_empty(),
        Err(err) => {
            log::warn!("failed to parse tool schema: {}", err);
            false
        }
    }
}

pub fn format_title(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOAN_SCHEMA: &str = r#"{
        "properties": {
            "amount": {"type": "number", "title": "Loan Amount"},
            "term_years": {"type": "integer"},
            "rate_kind": {"type": "string", "enum": ["fixed", "variable"]},
            "include_fees": {"type": "boolean"},
            "notes": {"type": "string", "description": "Anything else"},
            "schedule": {"type": "array"}
        },
        "required": ["amount", "rate_kind"]
    }"#;

    fn field<'a>(fields: &'a [ToolField], name: &str) -> &'a ToolField {
        fields.iter().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn kinds_map_to_the_closed_set() {
        let fields = parse_fields(LOAN_SCHEMA).unwrap();
        assert_eq!(field(&fields, "amount").kind, FieldKind::Number);
        assert_eq!(field(&fields, "term_years").kind, FieldKind::Number);
        assert_eq!(
            field(&fields, "rate_kind").kind,
            FieldKind::Choice(vec!["fixed".to_string(), "variable".to_string()])
        );
        assert_eq!(field(&fields, "include_fees").kind, FieldKind::Bool);
        assert_eq!(field(&fields, "notes").kind, FieldKind::Text);
        assert_eq!(
            field(&fields, "schedule").kind,
            FieldKind::Unsupported("array".to_string())
        );
    }

    #[test]
    fn titles_fall_back_to_the_formatted_name() {
        let fields = parse_fields(LOAN_SCHEMA).unwrap();
        assert_eq!(field(&fields, "amount").title, "Loan Amount");
        assert_eq!(field(&fields, "term_years").title, "Term Years");
    }

    #[test]
    fn required_flags_follow_the_schema() {
        let fields = parse_fields(LOAN_SCHEMA).unwrap();
        assert!(field(&fields, "amount").required);
        assert!(!field(&fields, "notes").required);
    }

    #[test]
    fn descriptions_are_carried_through() {
        let fields = parse_fields(LOAN_SCHEMA).unwrap();
        assert_eq!(
            field(&fields, "notes").description.as_deref(),
            Some("Anything else")
        );
    }

    #[test]
    fn empty_or_propertyless_schema_means_no_parameters() {
        assert!(parse_fields("").unwrap().is_empty());
        assert!(parse_fields("{}").unwrap().is_empty());
        assert!(!has_inputs(""));
        assert!(has_inputs(LOAN_SCHEMA));
    }

    #[test]
    fn malformed_schema_counts_as_no_inputs() {
        assert!(parse_fields("{not json").is_err());
        assert!(!has_inputs("{not json"));
    }

    #[test]
    fn names_format_into_titles() {
        assert_eq!(format_title("loan_calculator"), "Loan Calculator");
        assert_eq!(format_title("budget"), "Budget");
        assert_eq!(format_title("net__worth"), "Net Worth");
    }
}
