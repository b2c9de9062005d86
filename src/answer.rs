// 答案里的 <code>…</code> 拆成代码块，其余按普通文本显示
use once_cell::sync::Lazy;
use regex::Regex;

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<code>(.*?)(?:</code>|\z)").expect("static regex"));

pub const NO_ANSWER: &str = "No answer available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerBlock<'a> {
    Text(&'a str),
    Code(&'a str),
}

pub fn answer_blocks(answer: &str) -> Vec<AnswerBlock<'_>> {
    if answer.trim().is_empty() {
        return vec![AnswerBlock::Text(NO_ANSWER)];
    }
    let mut out = vec![];
    let mut last = 0;
    for caps in CODE_BLOCK.captures_iter(answer) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let before = &answer[last..whole.start()];
        if !before.trim().is_empty() {
            out.push(AnswerBlock::Text(before.trim_matches('\n')));
        }
        out.push(AnswerBlock::Code(body.as_str().trim_matches('\n')));
        last = whole.end();
    }
    let rest = &answer[last..];
    if !rest.trim().is_empty() {
        out.push(AnswerBlock::Text(rest.trim_matches('\n')));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_answer_is_one_block() {
        assert_eq!(
            answer_blocks("JVM runs bytecode."),
            vec![AnswerBlock::Text("JVM runs bytecode.")]
        );
    }

    #[test]
    fn empty_answer_has_placeholder() {
        assert_eq!(answer_blocks("  "), vec![AnswerBlock::Text(NO_ANSWER)]);
    }

    #[test]
    fn code_markers_become_code_blocks() {
        let blocks =
            answer_blocks("Use a map:\n<code>Map<K, V> m = new HashMap<>();</code>\nDone.");
        assert_eq!(
            blocks,
            vec![
                AnswerBlock::Text("Use a map:"),
                AnswerBlock::Code("Map<K, V> m = new HashMap<>();"),
                AnswerBlock::Text("Done."),
            ]
        );
    }

    #[test]
    fn unclosed_code_runs_to_the_end() {
        assert_eq!(
            answer_blocks("Example: <code>git rebase -i"),
            vec![
                AnswerBlock::Text("Example: "),
                AnswerBlock::Code("git rebase -i")
            ]
        );
    }
}
