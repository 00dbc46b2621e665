//! Layout checks: every source file has a unit suite and every suite is compiled

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::io;
    use std::path::Path;

    const SRC_DIR: &str = "src";
    const UNIT_DIR: &str = "tests/unit";

    fn is_organisational(relative: &str) -> bool {
        relative == "main.rs" || relative == "lib.rs" || relative.ends_with("mod.rs")
    }

    /// Relative paths of every `.rs` file and directory below `dir`
    fn collect_relative_paths(dir: &Path, base: &Path) -> Result<BTreeSet<String>, io::Error> {
        let mut paths = BTreeSet::new();
        if !dir.is_dir() {
            return Ok(paths);
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let relative = path
                .strip_prefix(base)
                .map_err(|_strip_error| io::Error::other("Failed to strip prefix"))?
                .to_string_lossy()
                .replace('\\', "/");

            if path.is_dir() {
                paths.extend(collect_relative_paths(&path, base)?);
                paths.insert(relative);
            } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
                paths.insert(relative);
            }
        }
        Ok(paths)
    }

    fn both_trees() -> (BTreeSet<String>, BTreeSet<String>) {
        let src = collect_relative_paths(Path::new(SRC_DIR), Path::new(SRC_DIR))
            .unwrap_or_else(|error| unreachable!("Failed to read src directory: {error}"));
        let unit = collect_relative_paths(Path::new(UNIT_DIR), Path::new(UNIT_DIR))
            .unwrap_or_default();
        (src, unit)
    }

    fn report(title: &str, lines: &[String]) -> String {
        format!("{title}:\n{}", lines.join("\n"))
    }

    #[test]
    fn test_all_src_files_have_unit_tests() {
        let (src, unit) = both_trees();

        let missing: Vec<String> = src
            .iter()
            .filter(|path| !is_organisational(path) && !unit.contains(*path))
            .map(|path| format!("  - src/{path} -> {UNIT_DIR}/{path}"))
            .collect();

        assert!(
            missing.is_empty(),
            "{}",
            report("Source files without a unit suite", &missing)
        );
    }

    #[test]
    fn test_all_unit_tests_have_src_counterparts() {
        let (src, unit) = both_trees();

        let orphaned: Vec<String> = unit
            .iter()
            .filter(|path| !path.ends_with("mod.rs") && !src.contains(*path))
            .map(|path| format!("  - {UNIT_DIR}/{path} -> src/{path} (missing)"))
            .collect();

        assert!(
            orphaned.is_empty(),
            "{}",
            report("Unit suites without a source file", &orphaned)
        );
    }

    // A suite missing from its mod.rs would never be compiled
    #[test]
    fn test_unit_suites_are_declared() {
        let (_, unit) = both_trees();
        let mut undeclared = Vec::new();

        for path in unit.iter().filter(|path| path.ends_with(".rs") && !path.ends_with("mod.rs")) {
            let Some((area, file)) = path.rsplit_once('/') else {
                continue;
            };
            let module = file.trim_end_matches(".rs");
            let declarations = fs::read_to_string(Path::new(UNIT_DIR).join(area).join("mod.rs"))
                .unwrap_or_default();

            if !declarations
                .lines()
                .any(|line| line.trim() == format!("pub mod {module};"))
            {
                undeclared.push(format!("  - {UNIT_DIR}/{area}/mod.rs lacks `pub mod {module};`"));
            }
        }

        assert!(
            undeclared.is_empty(),
            "{}",
            report("Unit suites not declared in their module", &undeclared)
        );
    }

    fn check_test_files(dir: &Path, base: &Path, without_tests: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                check_test_files(&path, base, without_tests)?;
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
                continue;
            }

            let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
            // Entry point and module organisation files hold no tests of their own
            if (path.parent() == Some(base) && file_name == "main.rs") || file_name == "mod.rs" {
                continue;
            }

            if !fs::read_to_string(&path)?.contains("#[test]") {
                without_tests.push(format!("  - {}", path.display()));
            }
        }
        Ok(())
    }

    #[test]
    fn test_all_test_files_contain_tests() {
        let tests_dir = Path::new("tests");
        let mut without_tests = Vec::new();

        if let Err(error) = check_test_files(tests_dir, tests_dir, &mut without_tests) {
            unreachable!("Failed to scan tests directory: {error}");
        }

        assert!(
            without_tests.is_empty(),
            "{}",
            report("Test files without any #[test] function", &without_tests)
        );
    }
}
