//! Institution descriptor file loading.

use std::fs;
use std::path::Path;

use crate::error::{HarvesterError, Result};
use crate::types::InstitutionDescriptor;

/// All configured institutions, in file order.
#[derive(Debug, Clone, Default)]
pub struct Institutions {
    descriptors: Vec<InstitutionDescriptor>,
}

impl Institutions {
    #[must_use]
    pub fn new(descriptors: Vec<InstitutionDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Load descriptors from a JSON file, or YAML when the extension is
    /// `.yaml`/`.yml`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "yaml" | "yml"));

        let descriptors = if is_yaml {
            serde_yaml_ng::from_str(&text)?
        } else {
            serde_json::from_str(&text)?
        };
        Ok(Self::new(descriptors))
    }

    /// Descriptor with the given id.
    pub fn get(&self, id: &str) -> Result<&InstitutionDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| HarvesterError::InstitutionNotFound(id.to_string()))
    }

    /// Descriptors for `ids`, or every descriptor when `ids` is empty.
    pub fn select(&self, ids: &[String]) -> Result<Vec<&InstitutionDescriptor>> {
        if ids.is_empty() {
            return Ok(self.descriptors.iter().collect());
        }
        ids.iter().map(|id| self.get(id)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstitutionDescriptor> {
        self.descriptors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const JSON: &str = r#"[
        {"institution": "Kansas City Public Library", "id": "kcpl1",
         "url": "https://example.org/oai", "@id_prefix": "missouri--urn:kcpl"},
        {"id": "mhm", "url": "", "@id_prefix": "missouri--urn:mhm", "exclude": "private"}
    ]"#;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json() {
        let file = write_file(".json", JSON);
        let institutions = Institutions::load(file.path()).unwrap();

        assert_eq!(institutions.len(), 2);
        assert_eq!(institutions.get("mhm").unwrap().exclude, vec!["private"]);
    }

    #[test]
    fn test_load_yaml() {
        let yaml = "- institution: Grinnell College\n  id: grinnell\n  url: https://example.edu/oai\n  metadata_prefix: mods\n  '@id_prefix': iowa--urn:grinnell\n  include: [postcards, maps]\n";
        let file = write_file(".yaml", yaml);
        let institutions = Institutions::load(file.path()).unwrap();

        let grinnell = institutions.get("grinnell").unwrap();
        assert_eq!(grinnell.metadata_prefix.as_deref(), Some("mods"));
        assert_eq!(grinnell.include, vec!["postcards", "maps"]);
    }

    #[test]
    fn test_select() {
        let file = write_file(".json", JSON);
        let institutions = Institutions::load(file.path()).unwrap();

        assert_eq!(institutions.select(&[]).unwrap().len(), 2);
        let picked = institutions.select(&["mhm".to_string()]).unwrap();
        assert_eq!(picked[0].id, "mhm");
        assert!(matches!(
            institutions.select(&["nope".to_string()]),
            Err(HarvesterError::InstitutionNotFound(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Institutions::load(Path::new("/nonexistent/institutions.json")),
            Err(HarvesterError::Io(_))
        ));
    }
}
