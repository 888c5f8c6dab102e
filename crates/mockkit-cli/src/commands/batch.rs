use std::path::{Path, PathBuf};

use anyhow::Context;
use mockkit_core::config::{MockkitConfig, CONFIG_FILE};
use mockkit_gen::{Generator, Options, Output};
use mockkit_parsers::Resolver;

use super::EXIT_FAILURE;

/// Run `mockkit batch`: generate every mock listed in the config file.
pub fn run(config: Option<PathBuf>) -> i32 {
    let result = std::env::current_dir()
        .context("failed to get current directory")
        .and_then(|cwd| {
            let path = cwd.join(config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE)));
            generate_all(&path)
        });
    match result {
        Ok(0) => 0,
        Ok(failed) => {
            eprintln!("mockkit batch: {failed} mock(s) failed");
            EXIT_FAILURE
        }
        Err(e) => {
            eprintln!("mockkit batch: {e:#}");
            EXIT_FAILURE
        }
    }
}

/// Generates the mocks of the config at `path`, resolving their modules
/// from the config's directory. Returns the number of failed entries.
fn generate_all(path: &Path) -> anyhow::Result<usize> {
    let config = MockkitConfig::from_file(path)?;
    if config.mocks.is_empty() {
        tracing::warn!(path = %path.display(), "no mocks configured");
        return Ok(0);
    }
    let base = path.parent().unwrap_or(Path::new("."));
    let mut generator = Generator::new(Resolver::new(base));

    let mut failed = 0;
    for spec in &config.mocks {
        let opts = Options::from_spec(spec, &config.generator);
        match generator.run(&opts) {
            Ok(Output::File(p)) => println!("{}", p.display()),
            Ok(Output::Stdout) => {}
            Err(e) => {
                eprintln!("mockkit batch: {} ({}): {e}", spec.trait_name, spec.src);
                failed += 1;
            }
        }
    }
    tracing::debug!(total = config.mocks.len(), failed, "batch finished");
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_batch_generates_each_entry() {
        let dir = tempfile::Builder::new().prefix("mockkit").tempdir().unwrap();
        let root = dir.path();
        write(root, "Cargo.toml", "[package]\nname = \"clock\"\nversion = \"0.1.0\"\n");
        write(root, "src/lib.rs", "pub mod time;\n");
        write(root, "src/time.rs", "pub trait Clock {\n    fn now(&self) -> u64;\n}\n");
        write(
            root,
            CONFIG_FILE,
            r#"{
                "generator": { "on_helpers": true },
                "mocks": [
                    { "src": "src/time.rs", "dst": "src/time.rs", "trait": "Clock" },
                    { "src": "src/time.rs", "dst": "src/time.rs", "trait": "Missing" }
                ]
            }"#,
        );

        let failed = generate_all(&root.join(CONFIG_FILE)).unwrap();
        assert_eq!(failed, 1);
        let written = fs::read_to_string(root.join("src/time/clock_mock.rs")).unwrap();
        assert!(written.contains("pub fn on_now(&self) -> mock::Call {"));
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let dir = tempfile::Builder::new().prefix("mockkit").tempdir().unwrap();
        let err = generate_all(&dir.path().join(CONFIG_FILE)).unwrap_err();
        assert!(format!("{err:#}").starts_with("failed to read"));
    }
}
