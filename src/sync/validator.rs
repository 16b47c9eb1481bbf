use serde_yaml::Value;

/// Structural validation of a candidate proxy configuration.
///
/// The document must be a mapping whose `model_list` is a non-empty list of
/// model entries, each carrying `model_name` and a `params` mapping with a
/// `model` field. All issues are aggregated so one bad document reports
/// every problem at once.
pub fn validate_document(bytes: &[u8]) -> Result<(), Vec<String>> {
    if bytes.is_empty() {
        return Err(vec!["document is empty".to_owned()]);
    }

    let doc: Value = match serde_yaml::from_slice(bytes) {
        Ok(doc) => doc,
        Err(err) => return Err(vec![format!("document is not valid YAML: {err}")]),
    };

    if !doc.is_mapping() {
        return Err(vec!["document root must be a mapping".to_owned()]);
    }

    let mut issues: Vec<String> = Vec::new();

    match doc.get("model_list") {
        None => issues.push("missing 'model_list' key".to_owned()),
        Some(list) => match list.as_sequence() {
            None => issues.push("'model_list' must be a list".to_owned()),
            Some(entries) if entries.is_empty() => {
                issues.push("'model_list' cannot be empty".to_owned())
            }
            Some(entries) => {
                for (idx, entry) in entries.iter().enumerate() {
                    validate_model_entry(idx, entry, &mut issues);
                }
            }
        },
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn validate_model_entry(idx: usize, entry: &Value, issues: &mut Vec<String>) {
    if !entry.is_mapping() {
        issues.push(format!("model_list[{idx}] must be a mapping"));
        return;
    }

    let name_missing = entry
        .get("model_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .map_or(true, str::is_empty);
    if name_missing {
        issues.push(format!("model_list[{idx}] missing 'model_name'"));
    }

    match entry.get("params") {
        None => issues.push(format!("model_list[{idx}] missing 'params'")),
        Some(params) if !params.is_mapping() => {
            issues.push(format!("model_list[{idx}] 'params' must be a mapping"))
        }
        Some(params) => {
            if params.get("model").is_none() {
                issues.push(format!("model_list[{idx}] missing 'params.model'"));
            }
        }
    }
}
