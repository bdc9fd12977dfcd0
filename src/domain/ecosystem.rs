//! Package ecosystem definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::version::VersionScheme;

/// Supported package ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    /// Ruby (Gemfile)
    Bundler,
    /// Rust (Cargo.toml)
    Cargo,
    /// PHP (composer.json)
    Composer,
    /// Container images (Dockerfile)
    Docker,
    /// GitHub Actions workflows
    #[serde(alias = "github-actions")]
    GithubActions,
    /// Go (go.mod)
    #[serde(alias = "gomod")]
    GoModules,
    /// Gradle builds
    Gradle,
    /// Elixir (mix.exs)
    #[serde(alias = "mix")]
    Hex,
    /// Maven (pom.xml)
    Maven,
    /// JavaScript (package.json)
    #[serde(alias = "npm")]
    NpmAndYarn,
    /// .NET (*.csproj)
    Nuget,
    /// Python (requirements.txt, pyproject.toml)
    Pip,
    /// Dart (pubspec.yaml)
    Pub,
    /// Terraform modules and providers
    Terraform,
    /// Python (uv.lock)
    Uv,
}

impl Ecosystem {
    /// Returns the version scheme used by this ecosystem
    pub fn version_scheme(&self) -> VersionScheme {
        match self {
            Ecosystem::NpmAndYarn | Ecosystem::Cargo => VersionScheme::Semver,
            Ecosystem::Pip | Ecosystem::Uv => VersionScheme::Pep440,
            Ecosystem::Docker | Ecosystem::GithubActions | Ecosystem::GoModules => {
                VersionScheme::Tag
            }
            Ecosystem::Bundler
            | Ecosystem::Composer
            | Ecosystem::Gradle
            | Ecosystem::Hex
            | Ecosystem::Maven
            | Ecosystem::Nuget
            | Ecosystem::Pub
            | Ecosystem::Terraform => VersionScheme::Generic,
        }
    }

    /// Returns the default dependency name normalizer for this ecosystem
    pub fn name_normalizer(&self) -> fn(&str) -> String {
        match self {
            Ecosystem::Pip | Ecosystem::Uv => normalize_python_name,
            Ecosystem::Composer => normalize_lowercase,
            _ => normalize_identity,
        }
    }

    /// Returns the identifier used in job files
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Bundler => "bundler",
            Ecosystem::Cargo => "cargo",
            Ecosystem::Composer => "composer",
            Ecosystem::Docker => "docker",
            Ecosystem::GithubActions => "github_actions",
            Ecosystem::GoModules => "go_modules",
            Ecosystem::Gradle => "gradle",
            Ecosystem::Hex => "hex",
            Ecosystem::Maven => "maven",
            Ecosystem::NpmAndYarn => "npm_and_yarn",
            Ecosystem::Nuget => "nuget",
            Ecosystem::Pip => "pip",
            Ecosystem::Pub => "pub",
            Ecosystem::Terraform => "terraform",
            Ecosystem::Uv => "uv",
        }
    }

    /// Returns all supported ecosystems
    pub fn all() -> &'static [Ecosystem] {
        &[
            Ecosystem::Bundler,
            Ecosystem::Cargo,
            Ecosystem::Composer,
            Ecosystem::Docker,
            Ecosystem::GithubActions,
            Ecosystem::GoModules,
            Ecosystem::Gradle,
            Ecosystem::Hex,
            Ecosystem::Maven,
            Ecosystem::NpmAndYarn,
            Ecosystem::Nuget,
            Ecosystem::Pip,
            Ecosystem::Pub,
            Ecosystem::Terraform,
            Ecosystem::Uv,
        ]
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// PEP 503 normalization: lowercase, runs of `-`, `_` and `.` become one `-`
pub fn normalize_python_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;

    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
            }
            in_separator = true;
        } else {
            normalized.extend(c.to_lowercase());
            in_separator = false;
        }
    }

    normalized
}

pub fn normalize_lowercase(name: &str) -> String {
    name.to_lowercase()
}

pub fn normalize_identity(name: &str) -> String {
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_scheme_selection() {
        assert_eq!(Ecosystem::NpmAndYarn.version_scheme(), VersionScheme::Semver);
        assert_eq!(Ecosystem::Cargo.version_scheme(), VersionScheme::Semver);
        assert_eq!(Ecosystem::Pip.version_scheme(), VersionScheme::Pep440);
        assert_eq!(Ecosystem::GithubActions.version_scheme(), VersionScheme::Tag);
        assert_eq!(Ecosystem::Maven.version_scheme(), VersionScheme::Generic);
    }

    #[test]
    fn test_python_name_normalization() {
        assert_eq!(normalize_python_name("Django_REST.framework"), "django-rest-framework");
        assert_eq!(normalize_python_name("zope--._interface"), "zope-interface");
        let normalize = Ecosystem::Uv.name_normalizer();
        assert_eq!(normalize("Requests"), "requests");
    }

    #[test]
    fn test_other_normalizers() {
        assert_eq!(Ecosystem::Composer.name_normalizer()("Monolog/Monolog"), "monolog/monolog");
        assert_eq!(Ecosystem::NpmAndYarn.name_normalizer()("@Types/Node"), "@Types/Node");
    }

    #[test]
    fn test_display_and_serde_agree() {
        for ecosystem in Ecosystem::all() {
            let json = serde_json::to_string(ecosystem).unwrap();
            assert_eq!(json, format!("\"{}\"", ecosystem));
        }
    }

    #[test]
    fn test_serde_aliases() {
        let parsed: Ecosystem = serde_json::from_str("\"npm\"").unwrap();
        assert_eq!(parsed, Ecosystem::NpmAndYarn);
        let parsed: Ecosystem = serde_json::from_str("\"github-actions\"").unwrap();
        assert_eq!(parsed, Ecosystem::GithubActions);
        let parsed: Ecosystem = serde_json::from_str("\"gomod\"").unwrap();
        assert_eq!(parsed, Ecosystem::GoModules);
    }
}
