// ---------------- 题库 ----------------
use std::{
    collections::{HashMap, HashSet},
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Question, QuestionId};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read question dataset {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("question dataset is not an array of question records: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question #{index} has an empty topic")]
    EmptyTopic { index: usize },
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
}

/// 启动时载入一次，之后只读。
#[derive(Debug)]
pub struct Repository {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl Repository {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let s = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let repo = Self::from_json(&s)?;
        info!(path = %path.display(), count = repo.len(), "question dataset loaded");
        Ok(repo)
    }

    pub fn from_json(s: &str) -> Result<Self, LoadError> {
        let questions: Vec<Question> = serde_json::from_str(s)?;
        Self::from_questions(questions)
    }

    pub fn from_questions(questions: Vec<Question>) -> Result<Self, LoadError> {
        let mut index = HashMap::with_capacity(questions.len());
        for (i, q) in questions.iter().enumerate() {
            if q.topic.trim().is_empty() {
                return Err(LoadError::EmptyTopic { index: i });
            }
            if index.insert(q.id.clone(), i).is_some() {
                return Err(LoadError::DuplicateId(q.id.clone()));
            }
        }
        debug!(count = questions.len(), "repository indexed");
        Ok(Self { questions, index })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.index.get(id).map(|&i| &self.questions[i])
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 去重后的主题，保持首次出现顺序
    pub fn topics(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.questions
            .iter()
            .map(|q| q.topic.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    pub fn count_in_topic(&self, topic: &str) -> usize {
        self.questions.iter().filter(|q| q.topic == topic).count()
    }

    pub fn high_priority_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_high_priority()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_dataset_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":1,"topic":"Java","question":"What is JVM?","answer":"Runtime",
                "difficulty":"Basic","priority":5}}]"#
        )
        .unwrap();
        let repo = Repository::load(file.path()).unwrap();
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get(&QuestionId::Num(1)).unwrap().topic, "Java");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Repository::load(&dir.path().join("questions.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn malformed_sources_are_rejected() {
        assert!(matches!(
            Repository::from_json(r#"{"id":1}"#),
            Err(LoadError::Parse(_))
        ));
        assert!(matches!(
            Repository::from_json(r#"[{"id":1,"question":"no topic"}]"#),
            Err(LoadError::Parse(_))
        ));
        assert!(matches!(
            Repository::from_json(r#"[{"id":1,"topic":" ","question":"q"}]"#),
            Err(LoadError::EmptyTopic { index: 0 })
        ));
        assert!(matches!(
            Repository::from_json(
                r#"[{"id":1,"topic":"A","question":"q"},{"id":1,"topic":"B","question":"r"}]"#
            ),
            Err(LoadError::DuplicateId(QuestionId::Num(1)))
        ));
    }

    #[test]
    fn topics_keep_first_appearance_order() {
        let repo = Repository::from_json(
            r#"[
                {"id":1,"topic":"SQL","question":"a","priority":4},
                {"id":2,"topic":"Git","question":"b"},
                {"id":3,"topic":"SQL","question":"c","priority":5}
            ]"#,
        )
        .unwrap();
        assert_eq!(repo.topics(), vec!["SQL", "Git"]);
        assert_eq!(repo.count_in_topic("SQL"), 2);
        assert_eq!(repo.high_priority_count(), 2);
    }

    #[test]
    fn bundled_sample_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/questions.json");
        let repo = Repository::load(&path).unwrap();
        assert_eq!(repo.len(), 15);
        let bonus = repo.get(&QuestionId::Text("bonus-1".into())).unwrap();
        assert_eq!(bonus.topic, "Playwright");
        assert_eq!(repo.get(&QuestionId::Num(13)).unwrap().answer, "");
    }
}
