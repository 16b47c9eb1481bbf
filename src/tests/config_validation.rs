#[cfg(test)]
mod tests {
    use crate::sync::validator::validate_document;
    use crate::tests::common::{VALID_DOC, VALID_DOC_V2};

    #[test]
    fn accepts_well_formed_documents() {
        assert!(validate_document(VALID_DOC.as_bytes()).is_ok());
        assert!(validate_document(VALID_DOC_V2.as_bytes()).is_ok());
    }

    #[test]
    fn rejects_empty_bytes() {
        let issues = validate_document(b"").unwrap_err();
        assert_eq!(issues, vec!["document is empty".to_owned()]);
    }

    #[test]
    fn rejects_non_yaml() {
        let issues = validate_document(b"model_list: [unclosed").unwrap_err();
        assert!(issues[0].contains("not valid YAML"));
    }

    #[test]
    fn rejects_non_mapping_root() {
        let issues = validate_document(b"just a string").unwrap_err();
        assert_eq!(issues, vec!["document root must be a mapping".to_owned()]);
    }

    #[test]
    fn rejects_missing_model_list() {
        let issues = validate_document(b"router:\n  mode: simple\n").unwrap_err();
        assert!(issues.iter().any(|i| i.contains("missing 'model_list'")));
    }

    #[test]
    fn rejects_model_list_that_is_not_a_list() {
        let issues = validate_document(b"model_list:\n  model_name: x\n").unwrap_err();
        assert!(issues.iter().any(|i| i.contains("must be a list")));
    }

    #[test]
    fn rejects_empty_model_list() {
        let issues = validate_document(b"model_list: []\n").unwrap_err();
        assert!(issues.iter().any(|i| i.contains("cannot be empty")));
    }

    #[test]
    fn rejects_entry_missing_required_fields() {
        let doc = b"model_list:\n  - model_name: gpt-4o\n";
        let issues = validate_document(doc).unwrap_err();
        assert!(issues.iter().any(|i| i.contains("model_list[0] missing 'params'")));
    }

    #[test]
    fn rejects_params_without_model() {
        let doc = b"model_list:\n  - model_name: gpt-4o\n    params:\n      api_base: http://x\n";
        let issues = validate_document(doc).unwrap_err();
        assert!(issues.iter().any(|i| i.contains("missing 'params.model'")));
    }

    #[test]
    fn aggregates_every_issue_in_one_pass() {
        let doc = b"model_list:\n  - params:\n      api_base: http://x\n  - model_name: ok\n";
        let issues = validate_document(doc).unwrap_err();
        // entry 0: missing model_name + params.model; entry 1: missing params
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn rejects_non_mapping_entry() {
        let doc = b"model_list:\n  - just-a-string\n";
        let issues = validate_document(doc).unwrap_err();
        assert!(issues.iter().any(|i| i.contains("must be a mapping")));
    }
}
