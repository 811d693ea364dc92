use immo_invest_core::EngineConfig;

use super::file;

/// Policy constants from `--config`, validated. YAML unless the file ends
/// in `.json`; defaults when no file is given.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config: EngineConfig = match path {
        None => return Ok(EngineConfig::default()),
        Some(p) if is_json(p) => file::read_json(p)?,
        Some(p) => file::read_yaml(p)?,
    };
    config.validate()?;
    log::debug!("config loaded from {:?}", path);
    Ok(config)
}

fn is_json(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_extension_detection() {
        assert!(is_json("policy.json"));
        assert!(is_json("policy.JSON"));
        assert!(!is_json("policy.yaml"));
        assert!(!is_json("policy"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_config(Some("does/not/exist.yaml")).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
