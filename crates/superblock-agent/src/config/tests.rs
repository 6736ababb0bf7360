#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.scoring.weight_pair(), (80, 20));
        assert_eq!(config.fields.id, "fid");
        assert_eq!(config.buildings.gklas, "GKLAS");
        assert_eq!(config.workspace.path, "./workspace");
        assert!(!config.workspace.keep_failed_runs);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = Config::from_toml_str(
            r#"
            [scoring]
            geb_weight = 40

            [fields]
            id = "parcel_no"

            [workspace]
            path = "/tmp/superblocks"
            "#,
        )
        .unwrap();
        assert_eq!(config.scoring.weight_pair(), (40, 60));
        assert_eq!(config.fields.id, "parcel_no");
        assert_eq!(config.fields.width, "width");
        assert_eq!(config.workspace.path, "/tmp/superblocks");
    }

    #[test]
    fn test_bad_ratio_ladder_rejected() {
        let err = Config::from_toml_str(
            r#"
            [[scoring.ratio.bands]]
            min_percent = 10.0
            score = 1

            [[scoring.ratio.bands]]
            min_percent = 50.0
            score = 2
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/superblock.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("superblock.toml");
        std::fs::write(&path, "[scoring]\ngeb_weight = 70\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.scoring.weight_pair(), (70, 30));
    }

    #[test]
    fn test_no_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(None, &dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config.scoring, ScoringConfig::default());
        assert_eq!(config.workspace.path, "./workspace");
        assert!(config.scoring_file.is_none());
    }

    #[test]
    fn test_default_file_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[workspace]\nkeep_failed_runs = true\n").unwrap();
        let config = Config::load_or_default(None, &path).unwrap();
        assert!(config.workspace.keep_failed_runs);
    }

    #[test]
    fn test_scoring_file_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("weights.yaml"), "geb_weight: 30\n").unwrap();
        let path = dir.path().join("superblock.toml");
        std::fs::write(&path, "scoring_file = \"weights.yaml\"\n\n[scoring]\ngeb_weight = 70\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.scoring.weight_pair(), (30, 70));
        assert_eq!(config.scoring_file, Some(dir.path().join("weights.yaml")));
    }

    #[test]
    fn test_replace_scoring_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoring.json");
        std::fs::write(&path, r#"{"geb_weight": 50, "verh_weight": 50}"#).unwrap();

        let mut config = Config::default();
        config.replace_scoring(&path).unwrap();
        assert_eq!(config.scoring.weight_pair(), (50, 50));

        let bad = dir.path().join("scoring.txt");
        std::fs::write(&bad, "geb_weight = 50").unwrap();
        let err = config.replace_scoring(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("scoring.txt"));
        assert_eq!(config.scoring.weight_pair(), (50, 50));
    }
}
