//! Built-in classification rules.

use diskprobe_core::{ApplyTo, InsightCategory, PatternRule};

/// The default rule catalogue: temporary files, tool caches, and
/// regenerable build artifacts. Build-artifact rules stop recursion so a
/// matched `node_modules` or `target` is reported once, as a whole.
pub fn default_rules() -> Vec<PatternRule> {
    use InsightCategory::{BuildArtifact, Cache, Temp};

    let file = ApplyTo::File;
    let dir = ApplyTo::Dir;

    let mut rules = vec![
        // ── Temporary files ──
        PatternRule::new("System Temp", "**/tmp/**", Temp),
        PatternRule::new("User Temp", "**/.tmp/**", Temp),
        PatternRule::new("Log Files", "**/*.log", Temp).apply_to(file),
        PatternRule::new("Python Bytecode", "**/__pycache__/**", Temp),
        PatternRule::new("Pytest Cache", "**/.pytest_cache/**", Temp),
        PatternRule::new("Mypy Cache", "**/.mypy_cache/**", Temp),
        PatternRule::new("Ruff Cache", "**/.ruff_cache/**", Temp),
        PatternRule::new("Coverage Files", "**/.coverage*", Temp),
        PatternRule::new("Editor Swaps", "**/*.{swp,swo,tmp,bak}", Temp).apply_to(file),
        PatternRule::new("macOS Metadata", "**/.DS_Store", Temp).apply_to(file),
        PatternRule::new("npm Logs", "**/npm-debug.log*", Temp).apply_to(file),
        PatternRule::new("Yarn Logs", "**/yarn-error.log*", Temp).apply_to(file),
        PatternRule::new(
            "Crash Reports",
            "**/Library/Application Support/CrashReporter/**",
            Temp,
        ),
        PatternRule::new("SQLite Journals", "**/*.db-journal", Temp).apply_to(file),
        // ── Package manager caches ──
        PatternRule::new("npm Cache", "**/.npm/**", Cache),
        PatternRule::new("Yarn Cache", "**/.cache/yarn/**", Cache),
        PatternRule::new("pnpm Store", "**/.pnpm-store/**", Cache),
        PatternRule::new("pip Cache", "**/.cache/pip/**", Cache),
        PatternRule::new("uv Cache", "**/.cache/uv/**", Cache),
        PatternRule::new("poetry Cache", "**/.cache/pypoetry/**", Cache),
        PatternRule::new("conda Packages", "**/.conda/pkgs/**", Cache),
        PatternRule::new("NuGet Cache", "**/.nuget/packages/**", Cache),
        PatternRule::new("Composer Cache", "**/.composer/cache/**", Cache),
        PatternRule::new("Bundler Cache", "**/.bundle/cache/**", Cache),
        // ── JVM ecosystem caches ──
        PatternRule::new("Gradle Cache", "**/.gradle/**", Cache),
        PatternRule::new("Maven Repo", "**/.m2/repository/**", Cache),
        PatternRule::new("Ivy Cache", "**/.ivy2/cache/**", Cache),
        PatternRule::new("SBT Boot", "**/.sbt/**", Cache),
        PatternRule::new("Coursier Cache", "**/.cache/coursier/**", Cache),
        // ── Rust / Go caches ──
        PatternRule::new("Cargo Registry", "**/.cargo/registry/**", Cache),
        PatternRule::new("rustup Downloads", "**/.rustup/downloads/**", Cache),
        PatternRule::new("Go Module Cache", "**/go/pkg/mod/**", Cache),
        PatternRule::new("Go Build Cache", "**/.cache/go-build/**", Cache),
        // ── JS build tool caches ──
        PatternRule::new("Turbo Cache", "**/.turbo/**", Cache),
        PatternRule::new("Parcel Cache", "**/.parcel-cache/**", Cache),
        PatternRule::new("Node GYP", "**/.node-gyp/**", Cache),
        // ── Containers / infra caches ──
        PatternRule::new("Kube Cache", "**/.kube/cache/**", Cache),
        PatternRule::new("Ansible Temp", "**/.ansible/tmp/**", Cache),
        // ── ML model caches ──
        PatternRule::new("HuggingFace Cache", "**/.cache/huggingface/**", Cache),
        PatternRule::new("PyTorch Cache", "**/.cache/torch/**", Cache),
        PatternRule::new("Whisper Cache", "**/.cache/whisper/**", Cache),
        PatternRule::new("Ollama Models", "**/.ollama/**", Cache),
        // ── Linters / pre-commit ──
        PatternRule::new("pre-commit Cache", "**/.cache/pre-commit/**", Cache),
    ];

    let build = [
        // ── JS / Node ──
        ("node_modules", "**/node_modules/**"),
        ("Bower Components", "**/bower_components/**"),
        ("Next.js build", "**/.next/**"),
        ("Nuxt build", "**/.nuxt/**"),
        // ── Python ──
        ("Python venv", "**/.venv/**"),
        ("Python venv", "**/venv/**"),
        ("Python cache", "**/__pycache__/**"),
        ("tox env", "**/.tox/**"),
        // ── Generic build outputs ──
        ("Build dir", "**/build/**"),
        ("Dist dir", "**/dist/**"),
        ("Object files", "**/obj/**"),
        ("Coverage artifacts", "**/coverage/**"),
        // ── Native / compiled languages ──
        ("Rust target", "**/target/**"),
        ("Swift build", "**/.build/**"),
        ("CMake build", "**/CMakeFiles/**"),
        ("Zig cache", "**/zig-cache/**"),
    ];
    rules.extend(
        build
            .into_iter()
            .map(|(name, pattern)| PatternRule::new(name, pattern, BuildArtifact).stop_recursion()),
    );
    rules.push(
        PatternRule::new("Python Egg Info", "**/*.egg-info", BuildArtifact)
            .apply_to(dir)
            .stop_recursion(),
    );

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_size_and_split() {
        let rules = default_rules();
        assert_eq!(rules.len(), 60);

        let count = |cat: InsightCategory| rules.iter().filter(|r| r.category == cat).count();
        assert_eq!(count(InsightCategory::Temp), 14);
        assert_eq!(count(InsightCategory::Cache), 29);
        assert_eq!(count(InsightCategory::BuildArtifact), 17);
    }

    #[test]
    fn test_build_artifact_rules_stop_recursion() {
        for rule in default_rules() {
            if rule.category == InsightCategory::BuildArtifact {
                assert!(rule.stop_recursion, "{} must stop recursion", rule.name);
            }
        }
    }

    #[test]
    fn test_fast_patterns_use_double_star_prefix() {
        for rule in default_rules() {
            assert!(
                rule.pattern.starts_with("**/"),
                "{} lacks the **/ prefix",
                rule.pattern
            );
        }
    }
}
