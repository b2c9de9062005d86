// ---------------- 学习进度（done / revise / starred） ----------------
use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    model::QuestionId,
    store::{KvStore, MemoryStore, StoreError},
};

/// 本地存储中保存整张进度表的固定 key
pub const PROGRESS_KEY: &str = "prepmaster_tags";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Done,
    Revise,
    Starred,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Revise => "revise",
            Self::Starred => "starred",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown progress tag {0:?}")]
pub struct UnknownTag(pub String);

impl FromStr for Tag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "done" => Ok(Self::Done),
            "revise" => Ok(Self::Revise),
            "starred" => Ok(Self::Starred),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressTag {
    #[serde(default, skip_serializing_if = "is_false")]
    pub done: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub revise: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub starred: bool,
}

impl ProgressTag {
    pub fn get(&self, tag: Tag) -> bool {
        match tag {
            Tag::Done => self.done,
            Tag::Revise => self.revise,
            Tag::Starred => self.starred,
        }
    }

    fn flip(&mut self, tag: Tag) -> bool {
        let slot = match tag {
            Tag::Done => &mut self.done,
            Tag::Revise => &mut self.revise,
            Tag::Starred => &mut self.starred,
        };
        *slot = !*slot;
        *slot
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressStats {
    pub completed: usize,
    pub revise: usize,
    pub starred: usize,
}

impl ProgressStats {
    /// 完成百分比，保留一位小数；题库为空时为 0
    pub fn percent_of(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let pct = self.completed as f64 / total as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }
}

pub struct ProgressStore {
    backend: Box<dyn KvStore>,
    tags: BTreeMap<String, ProgressTag>,
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    /// 读取失败或格式不对都视为空表
    pub fn open(backend: Box<dyn KvStore>) -> Self {
        let tags = match backend.get(PROGRESS_KEY) {
            Some(v) => serde_json::from_value(v).unwrap_or_else(|err| {
                warn!(error = %err, "stored progress is corrupt, starting empty");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        debug!(records = tags.len(), "progress store opened");
        Self { backend, tags }
    }

    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStore::new()))
    }

    pub fn get(&self, id: &QuestionId) -> ProgressTag {
        self.tags.get(&id.to_string()).copied().unwrap_or_default()
    }

    /// 翻转标记后整表回写；返回新值。写入失败时内存中的表保持原样。
    /// id 不校验是否存在于题库，未知 id 会留下孤立记录。
    pub fn toggle(&mut self, id: &QuestionId, tag: Tag) -> Result<bool, StoreError> {
        let mut next = self.tags.clone();
        let value = next.entry(id.to_string()).or_default().flip(tag);
        let snapshot = serde_json::to_value(&next)?;
        self.backend.set(PROGRESS_KEY, snapshot)?;
        self.tags = next;
        debug!(%id, %tag, value, "progress tag toggled");
        Ok(value)
    }

    pub fn stats(&self) -> ProgressStats {
        self.tags
            .values()
            .fold(ProgressStats::default(), |mut acc, t| {
                acc.completed += usize::from(t.done);
                acc.revise += usize::from(t.revise);
                acc.starred += usize::from(t.starred);
                acc
            })
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_record_reads_all_false() {
        let store = ProgressStore::in_memory();
        assert_eq!(store.get(&QuestionId::Num(42)), ProgressTag::default());
    }

    #[test]
    fn double_toggle_restores_value() {
        let mut store = ProgressStore::in_memory();
        let id = QuestionId::Num(1);
        assert!(store.toggle(&id, Tag::Done).unwrap());
        assert!(!store.toggle(&id, Tag::Done).unwrap());
        assert!(!store.get(&id).done);
    }

    #[test]
    fn starring_shows_up_in_stats() {
        let mut store = ProgressStore::in_memory();
        store.toggle(&QuestionId::Num(1), Tag::Starred).unwrap();
        assert_eq!(
            store.stats(),
            ProgressStats {
                completed: 0,
                revise: 0,
                starred: 1
            }
        );
    }

    #[test]
    fn every_toggle_persists_the_whole_mapping() {
        let backend = MemoryStore::new();
        let mut store = ProgressStore::open(Box::new(backend.clone()));
        store.toggle(&QuestionId::Num(1), Tag::Done).unwrap();
        store.toggle(&QuestionId::from("x"), Tag::Revise).unwrap();
        assert_eq!(backend.writes(), 2);
        assert_eq!(
            backend.get(PROGRESS_KEY),
            Some(json!({"1": {"done": true}, "x": {"revise": true}}))
        );

        let reopened = ProgressStore::open(Box::new(backend));
        assert!(reopened.get(&QuestionId::Num(1)).done);
        assert!(reopened.get(&QuestionId::from("x")).revise);
    }

    #[test]
    fn corrupt_entry_is_treated_as_empty() {
        let backend = MemoryStore::with_entry(PROGRESS_KEY, json!("garbage"));
        let store = ProgressStore::open(Box::new(backend));
        assert_eq!(store.len(), 0);
        assert_eq!(store.stats(), ProgressStats::default());
    }

    #[test]
    fn orphan_ids_are_accepted() {
        let mut store = ProgressStore::in_memory();
        store.toggle(&QuestionId::Num(999), Tag::Revise).unwrap();
        assert_eq!(store.stats().revise, 1);
    }

    #[test]
    fn unknown_tag_name_is_rejected() {
        assert_eq!("starred".parse::<Tag>(), Ok(Tag::Starred));
        assert_eq!("pinned".parse::<Tag>(), Err(UnknownTag("pinned".into())));
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        let stats = ProgressStats {
            completed: 1,
            revise: 0,
            starred: 0,
        };
        assert_eq!(stats.percent_of(3), 33.3);
        assert_eq!(stats.percent_of(0), 0.0);
    }

    struct ReadOnly;

    impl KvStore for ReadOnly {
        fn get(&self, _key: &str) -> Option<serde_json::Value> {
            None
        }

        fn set(&mut self, _key: &str, _value: serde_json::Value) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: "progress.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let mut store = ProgressStore::open(Box::new(ReadOnly));
        let id = QuestionId::Num(1);
        assert!(store.toggle(&id, Tag::Done).is_err());
        assert!(!store.get(&id).done);
        assert_eq!(store.stats(), ProgressStats::default());
        assert_eq!(store.len(), 0);
    }
}
