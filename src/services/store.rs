use crate::error::{PomcrawlError, Result};
use crate::types::PageModel;
use std::fs;
use std::path::{Path, PathBuf};

/// Downstream persistence collaborator: accepts a page model, returns
/// where it was stored.
pub trait ModelStore {
    fn write_page_model(&self, page: &PageModel) -> Result<PathBuf>;
}

/// Writes each page model as pretty JSON under `<output>/models_json/`.
pub struct LocalFsStore {
    models_dir: PathBuf,
}

impl LocalFsStore {
    pub fn new(output_dir: &Path) -> Result<Self> {
        let models_dir = output_dir.join("models_json");
        fs::create_dir_all(&models_dir).map_err(|e| {
            PomcrawlError::storage_error("initialization", e.to_string())
        })?;
        Ok(Self { models_dir })
    }
}

impl ModelStore for LocalFsStore {
    fn write_page_model(&self, page: &PageModel) -> Result<PathBuf> {
        let target = self.models_dir.join(format!("{}.json", page.page_name));
        let file = fs::File::create(&target)?;
        serde_json::to_writer_pretty(file, page)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageModel, SectionModel};
    use chrono::Utc;

    fn sample_page() -> PageModel {
        PageModel {
            page_id: "login".into(),
            page_name: "LoginPage".into(),
            url: "https://example.com/login".into(),
            route: "/login".into(),
            sections: vec![SectionModel {
                name: "mainContent".into(),
                elements: vec![],
            }],
            actions: vec![],
            discovered_links: vec![],
            navigation_hints: vec![],
            modeled_at: Utc::now(),
        }
    }

    #[test]
    fn writes_model_json_named_after_the_page() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(tmp.path()).unwrap();

        let path = store.write_page_model(&sample_page()).unwrap();
        assert!(path.ends_with("models_json/LoginPage.json"));
        assert!(path.exists());

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["page_name"], "LoginPage");
        assert_eq!(parsed["route"], "/login");
    }
}
