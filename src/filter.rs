// ---------------- 筛选 ----------------
// 依次按 主题 -> 关键词 -> 难度 -> 状态 做与运算，结果保持题库原顺序。
use crate::{
    criteria::{FilterCriteria, StatusFilter},
    model::Question,
    progress::{ProgressStore, ProgressTag},
};

pub fn matches_status(tag: ProgressTag, status: StatusFilter) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::Done => tag.done,
        StatusFilter::Revise => tag.revise,
        StatusFilter::Starred => tag.starred,
        StatusFilter::Pending => !tag.done,
    }
}

pub fn apply<'a>(
    questions: &'a [Question],
    criteria: &FilterCriteria,
    progress: &ProgressStore,
) -> Vec<&'a Question> {
    select(questions, criteria, progress, true)
}

/// 与 apply 相同但忽略关键词，用于判断"当前筛选是否没有任何结果"
pub fn apply_ignoring_query<'a>(
    questions: &'a [Question],
    criteria: &FilterCriteria,
    progress: &ProgressStore,
) -> Vec<&'a Question> {
    select(questions, criteria, progress, false)
}

fn select<'a>(
    questions: &'a [Question],
    criteria: &FilterCriteria,
    progress: &ProgressStore,
    with_query: bool,
) -> Vec<&'a Question> {
    // 空串直接关闭文本过滤
    let query = if with_query && !criteria.query.is_empty() {
        Some(criteria.query.to_lowercase())
    } else {
        None
    };
    questions
        .iter()
        .filter(|q| criteria.topic.matches(&q.topic))
        .filter(|q| query.as_deref().map_or(true, |lq| q.matches_lowercase(lq)))
        .filter(|q| criteria.difficulty.matches(&q.difficulty))
        .filter(|q| matches_status(progress.get(&q.id), criteria.status))
        .collect()
}
