//! On-disk paper cache.
//!
//! Layout: `<root>/<topic_dir>/papers_info.json`, where `topic_dir` is the
//! topic lowercased with spaces replaced by underscores, and the file is a
//! JSON object mapping short arXiv ids to [`PaperInfo`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const PAPERS_FILE: &str = "papers_info.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperInfo {
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    /// `YYYY-MM-DD`.
    pub published: String,
    pub pdf_url: String,
}

/// One search hit: short id (e.g. `2401.01234v2`) plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Paper {
    pub id: String,
    pub info: PaperInfo,
}

pub type TopicPapers = BTreeMap<String, PaperInfo>;

/// What reading one topic's cache file produced.
#[derive(Debug)]
pub enum TopicLoad {
    Missing,
    Corrupt(serde_json::Error),
    Papers(TopicPapers),
}

#[derive(Debug, Clone)]
pub struct PaperStore {
    root: PathBuf,
}

/// `"Machine Learning"` → `"machine_learning"`.
///
/// `None` when the name could leave the cache root: empty names, `.` and
/// `..`, and anything holding a path separator or drive colon.
pub fn topic_dir_name(topic: &str) -> Option<String> {
    let name = topic.to_lowercase().replace(' ', "_");
    let escapes = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', ':', '\0']);
    (!escapes).then_some(name)
}

impl PaperStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache file for `topic`, always directly below the root.
    pub fn topic_file(&self, topic: &str) -> Option<PathBuf> {
        topic_dir_name(topic).map(|dir| self.root.join(dir).join(PAPERS_FILE))
    }

    /// Unusable topic names read as missing.
    pub fn load_topic(&self, topic: &str) -> TopicLoad {
        match self.topic_file(topic) {
            Some(path) => read_papers(&path),
            None => TopicLoad::Missing,
        }
    }

    /// Merge `papers` into the topic's cache file, creating it if needed.
    /// A missing or corrupt existing file is replaced.
    pub fn save(&self, topic: &str, papers: &[Paper]) -> std::io::Result<PathBuf> {
        let path = self.topic_file(topic).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid topic name: {topic:?}"),
            )
        })?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut existing = match read_papers(&path) {
            TopicLoad::Papers(map) => map,
            TopicLoad::Missing => TopicPapers::new(),
            TopicLoad::Corrupt(e) => {
                tracing::warn!(path = %path.display(), error = %e, "replacing corrupt paper cache");
                TopicPapers::new()
            }
        };
        for paper in papers {
            existing.insert(paper.id.clone(), paper.info.clone());
        }

        let json = serde_json::to_string_pretty(&existing)?;
        fs::write(&path, json)?;
        tracing::info!(path = %path.display(), papers = existing.len(), "paper cache saved");
        Ok(path)
    }

    /// Look a paper up across every topic folder. Unreadable files are
    /// skipped.
    pub fn find(&self, paper_id: &str) -> std::io::Result<Option<PaperInfo>> {
        for dir in self.topic_dirs()? {
            let file = dir.join(PAPERS_FILE);
            match read_papers(&file) {
                TopicLoad::Papers(mut map) => {
                    if let Some(info) = map.remove(paper_id) {
                        return Ok(Some(info));
                    }
                }
                TopicLoad::Corrupt(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "skipping unreadable paper cache");
                }
                TopicLoad::Missing => {}
            }
        }
        Ok(None)
    }

    /// Names of topic folders that hold a cache file, sorted.
    pub fn folders(&self) -> std::io::Result<Vec<String>> {
        Ok(self
            .topic_dirs()?
            .into_iter()
            .filter(|dir| dir.join(PAPERS_FILE).is_file())
            .filter_map(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect())
    }

    fn topic_dirs(&self) -> std::io::Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        Ok(dirs)
    }
}

fn read_papers(path: &Path) -> TopicLoad {
    match fs::read_to_string(path) {
        Err(_) => TopicLoad::Missing,
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(map) => TopicLoad::Papers(map),
            Err(e) => TopicLoad::Corrupt(e),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn paper(id: &str, title: &str) -> Paper {
        Paper {
            id: id.into(),
            info: PaperInfo {
                title: title.into(),
                summary: format!("Summary of {title}"),
                authors: vec!["Ada Lovelace".into(), "Alan Turing".into()],
                published: "2024-01-02".into(),
                pdf_url: format!("http://arxiv.org/pdf/{id}"),
            },
        }
    }

    #[test]
    fn topic_names_are_normalized() {
        assert_eq!(topic_dir_name("Machine Learning").as_deref(), Some("machine_learning"));
        assert_eq!(topic_dir_name("nlp").as_deref(), Some("nlp"));
        assert_eq!(topic_dir_name("..hidden").as_deref(), Some("..hidden"));
    }

    #[test]
    fn topic_names_cannot_leave_the_root() {
        for topic in ["", ".", "..", "../escaped", "a/b", "/etc", "a\\b", "c:", "x\0y"] {
            assert_eq!(topic_dir_name(topic), None, "{topic:?}");
        }
    }

    #[test]
    fn save_rejects_escaping_topics() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("papers");
        let store = PaperStore::new(&root);

        let err = store.save("../escaped", &[paper("1", "a")]).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(!tmp.path().join("escaped").exists());
        assert!(matches!(store.load_topic("../escaped"), TopicLoad::Missing));
    }

    #[test]
    fn save_merges_with_existing_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());

        store.save("Machine Learning", &[paper("1111.0001v1", "First")]).unwrap();
        let path = store
            .save("machine learning", &[paper("2222.0002v1", "Second"), paper("1111.0001v1", "First v2")])
            .unwrap();

        assert_eq!(path, tmp.path().join("machine_learning").join(PAPERS_FILE));
        let TopicLoad::Papers(map) = store.load_topic("Machine Learning") else {
            panic!("expected papers");
        };
        assert_eq!(map.len(), 2);
        assert_eq!(map["1111.0001v1"].title, "First v2");
    }

    #[test]
    fn corrupt_cache_is_replaced_on_save() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        let file = store.topic_file("nlp").unwrap();
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "{ broken").unwrap();

        assert!(matches!(store.load_topic("nlp"), TopicLoad::Corrupt(_)));
        store.save("nlp", &[paper("3333.0003v1", "Third")]).unwrap();
        assert!(matches!(store.load_topic("nlp"), TopicLoad::Papers(m) if m.len() == 1));
    }

    #[test]
    fn find_searches_every_topic_and_skips_corrupt_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        store.save("ml", &[paper("1111.0001v1", "First")]).unwrap();
        store.save("physics", &[paper("4444.0004v1", "Fourth")]).unwrap();
        let bad = tmp.path().join("aaa_broken");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join(PAPERS_FILE), "not json").unwrap();

        assert_eq!(store.find("4444.0004v1").unwrap().unwrap().title, "Fourth");
        assert!(store.find("9999.9999v9").unwrap().is_none());
    }

    #[test]
    fn folders_lists_only_dirs_with_a_cache_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PaperStore::new(tmp.path());
        store.save("nlp", &[paper("1", "a")]).unwrap();
        store.save("ml", &[paper("2", "b")]).unwrap();
        fs::create_dir_all(tmp.path().join("empty_topic")).unwrap();
        fs::write(tmp.path().join("stray.txt"), "x").unwrap();

        assert_eq!(store.folders().unwrap(), ["ml", "nlp"]);
    }

    #[test]
    fn missing_root_has_no_folders() {
        let store = PaperStore::new("/definitely/not/here");
        assert!(store.folders().unwrap().is_empty());
        assert!(store.find("x").unwrap().is_none());
    }
}
