//! Skill Taxonomy — folds free-text skill and requirement strings onto canonical ids.
//!
//! Canonicalization is exact-match after normalization (trim + lowercase).
//! Strings with no table entry are their own canonical id.
//!
//! The table is loaded once at startup and shared as `Arc<SkillTaxonomy>`.
//! It is never mutated afterwards.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::matching::MatchError;

/// Taxonomy shipped with the binary. `TAXONOMY_PATH` replaces it wholesale.
const BUILTIN_TAXONOMY: &str = include_str!("../../data/taxonomy.json");
const BUILTIN_SOURCE: &str = "builtin taxonomy";

/// On-disk format: `{ "skills": { "<canonical>": ["alias", ...] } }`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaxonomyFile {
    skills: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct SkillTaxonomy {
    /// normalized alias (canonical names included) → canonical id
    lookup: HashMap<String, String>,
    /// canonical id → its aliases, in file order
    synonyms: BTreeMap<String, Vec<String>>,
}

/// Lower-cases and strips a raw skill string.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl SkillTaxonomy {
    /// Loads from `path` when given, otherwise the built-in table.
    pub fn load(path: Option<&Path>) -> Result<Self, MatchError> {
        let taxonomy = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::builtin()?,
        };
        info!(
            "Skill taxonomy ready: {} canonical skills, {} lookup keys",
            taxonomy.len(),
            taxonomy.lookup.len()
        );
        Ok(taxonomy)
    }

    pub fn builtin() -> Result<Self, MatchError> {
        Self::from_json_str(BUILTIN_TAXONOMY, BUILTIN_SOURCE)
    }

    pub fn from_path(path: &Path) -> Result<Self, MatchError> {
        let source_name = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|e| MatchError::TaxonomyLoad {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&raw, &source_name)
    }

    pub fn from_json_str(raw: &str, source_name: &str) -> Result<Self, MatchError> {
        let file: TaxonomyFile =
            serde_json::from_str(raw).map_err(|e| MatchError::TaxonomyLoad {
                source_name: source_name.to_string(),
                reason: format!("malformed JSON: {e}"),
            })?;
        Self::from_map(file.skills, source_name)
    }

    /// Builds the lookup table, rejecting blank names and aliases that would
    /// fold onto more than one canonical id.
    pub fn from_map(
        skills: BTreeMap<String, Vec<String>>,
        source_name: &str,
    ) -> Result<Self, MatchError> {
        let fail = |reason: String| MatchError::TaxonomyLoad {
            source_name: source_name.to_string(),
            reason,
        };

        if skills.is_empty() {
            return Err(fail("taxonomy contains no skills".to_string()));
        }

        let mut lookup: HashMap<String, String> = HashMap::new();

        // Canonical names first, so an alias colliding with any of them is caught
        // regardless of map order.
        for canonical in skills.keys() {
            let canonical = normalize(canonical);
            if canonical.is_empty() {
                return Err(fail("blank canonical skill name".to_string()));
            }
            if lookup.insert(canonical.clone(), canonical.clone()).is_some() {
                return Err(fail(format!("canonical skill '{canonical}' is listed twice")));
            }
        }

        let mut synonyms = BTreeMap::new();
        for (canonical, aliases) in &skills {
            let canonical = normalize(canonical);
            let mut kept = Vec::with_capacity(aliases.len());

            for alias in aliases {
                let alias = normalize(alias);
                if alias.is_empty() {
                    return Err(fail(format!("blank alias under '{canonical}'")));
                }
                match lookup.get(&alias) {
                    Some(existing) if *existing == canonical => {
                        debug!("Ignoring repeated alias '{alias}' for '{canonical}'");
                    }
                    Some(existing) => {
                        return Err(fail(format!(
                            "alias '{alias}' maps to both '{existing}' and '{canonical}'"
                        )));
                    }
                    None => {
                        lookup.insert(alias.clone(), canonical.clone());
                        kept.push(alias);
                    }
                }
            }

            synonyms.insert(canonical, kept);
        }

        Ok(Self { lookup, synonyms })
    }

    /// Maps a raw skill or requirement string to its canonical id.
    pub fn canonicalize(&self, raw: &str) -> String {
        let normalized = normalize(raw);
        match self.lookup.get(&normalized) {
            Some(canonical) => canonical.clone(),
            None => normalized,
        }
    }

    /// Canonical id followed by every alias that folds onto it.
    /// Unknown skills yield only their normalized form.
    pub fn synonyms(&self, raw: &str) -> Vec<String> {
        let canonical = self.canonicalize(raw);
        let mut out = vec![canonical.clone()];
        if let Some(aliases) = self.synonyms.get(&canonical) {
            out.extend(aliases.iter().cloned());
        }
        out
    }

    pub fn is_known(&self, raw: &str) -> bool {
        self.lookup.contains_key(&normalize(raw))
    }

    /// Number of canonical skills.
    pub fn len(&self) -> usize {
        self.synonyms.len()
    }

    /// Always false for a loaded taxonomy; an empty table fails validation.
    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small_taxonomy() -> SkillTaxonomy {
        let mut skills = BTreeMap::new();
        skills.insert(
            "python".to_string(),
            vec!["python3".to_string(), "Py".to_string()],
        );
        skills.insert("SQL".to_string(), vec!["t-sql".to_string()]);
        SkillTaxonomy::from_map(skills, "test").unwrap()
    }

    #[test]
    fn test_builtin_taxonomy_loads_with_breadth() {
        let taxonomy = SkillTaxonomy::builtin().unwrap();
        assert!(taxonomy.len() >= 50, "only {} skills", taxonomy.len());
        assert!(!taxonomy.is_empty());
        for (canonical, aliases) in &taxonomy.synonyms {
            assert!(
                !aliases.is_empty(),
                "canonical '{canonical}' has no aliases"
            );
        }
    }

    #[test]
    fn test_canonicalize_folds_aliases() {
        let taxonomy = small_taxonomy();
        assert_eq!(taxonomy.canonicalize("Python"), "python");
        assert_eq!(taxonomy.canonicalize("  python3 "), "python");
        assert_eq!(taxonomy.canonicalize("PY"), "python");
        assert_eq!(taxonomy.canonicalize("T-SQL"), "sql");
    }

    #[test]
    fn test_canonical_keys_are_normalized_on_load() {
        let taxonomy = small_taxonomy();
        assert_eq!(taxonomy.canonicalize("SQL"), "sql");
        assert!(taxonomy.is_known("sql"));
    }

    #[test]
    fn test_alias_and_canonical_are_symmetric_in_builtin() {
        let taxonomy = SkillTaxonomy::builtin().unwrap();
        for (canonical, aliases) in &taxonomy.synonyms {
            assert_eq!(&taxonomy.canonicalize(canonical), canonical);
            for alias in aliases {
                assert_eq!(
                    taxonomy.canonicalize(alias),
                    taxonomy.canonicalize(canonical),
                    "alias '{alias}'"
                );
            }
        }
    }

    #[test]
    fn test_unknown_skill_is_self_canonical() {
        let taxonomy = small_taxonomy();
        assert_eq!(taxonomy.canonicalize("  Obscure DSL "), "obscure dsl");
        assert!(!taxonomy.is_known("obscure dsl"));
    }

    #[test]
    fn test_no_partial_matching() {
        let taxonomy = small_taxonomy();
        assert_eq!(
            taxonomy.canonicalize("5+ years Python experience"),
            "5+ years python experience"
        );
    }

    #[test]
    fn test_synonyms_include_canonical_first() {
        let taxonomy = small_taxonomy();
        assert_eq!(taxonomy.synonyms("py"), vec!["python", "python3", "py"]);
        assert_eq!(taxonomy.synonyms("Haskell"), vec!["haskell"]);
    }

    #[test]
    fn test_conflicting_alias_is_rejected() {
        let mut skills = BTreeMap::new();
        skills.insert("sql".to_string(), vec!["postgres".to_string()]);
        skills.insert("postgresql".to_string(), vec!["Postgres".to_string()]);
        let err = SkillTaxonomy::from_map(skills, "test").unwrap_err();
        assert!(matches!(err, MatchError::TaxonomyLoad { .. }));
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn test_alias_equal_to_other_canonical_is_rejected() {
        let mut skills = BTreeMap::new();
        skills.insert("javascript".to_string(), vec!["node.js".to_string()]);
        skills.insert("node.js".to_string(), vec!["nodejs".to_string()]);
        assert!(SkillTaxonomy::from_map(skills, "test").is_err());
    }

    #[test]
    fn test_canonical_listed_as_own_alias_is_tolerated() {
        let mut skills = BTreeMap::new();
        skills.insert("aws".to_string(), vec!["AWS".to_string(), "amazon web services".to_string()]);
        let taxonomy = SkillTaxonomy::from_map(skills, "test").unwrap();
        assert_eq!(taxonomy.synonyms("aws"), vec!["aws", "amazon web services"]);
    }

    #[test]
    fn test_empty_taxonomy_is_rejected() {
        let err = SkillTaxonomy::from_json_str(r#"{"skills": {}}"#, "test").unwrap_err();
        assert!(err.to_string().contains("no skills"));
    }

    #[test]
    fn test_blank_alias_is_rejected() {
        let err =
            SkillTaxonomy::from_json_str(r#"{"skills": {"go": ["golang", "  "]}}"#, "test")
                .unwrap_err();
        assert!(err.to_string().contains("blank alias"));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = SkillTaxonomy::from_json_str(r#"{"skills": ["python"]}"#, "test").unwrap_err();
        assert!(err.to_string().contains("malformed JSON"));
    }

    #[test]
    fn test_load_from_file_overrides_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"skills": {{"cobol": ["cobol-85", "ibm cobol"]}}}}"#).unwrap();

        let taxonomy = SkillTaxonomy::load(Some(file.path())).unwrap();
        assert_eq!(taxonomy.len(), 1);
        assert!(!taxonomy.is_empty());
        assert_eq!(taxonomy.canonicalize("IBM COBOL"), "cobol");
        // builtin entries are not merged in
        assert_eq!(taxonomy.canonicalize("python3"), "python3");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = SkillTaxonomy::load(Some(Path::new("/nonexistent/taxonomy.json"))).unwrap_err();
        match err {
            MatchError::TaxonomyLoad { source_name, .. } => {
                assert!(source_name.contains("nonexistent"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
