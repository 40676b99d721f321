//! Chunk Ordering
//!
//! Decides the order in which chunk bodies are concatenated into a stage.
//!
//! 1. Chunks without a rule keep their relative order.
//! 2. Each `first` chunk is inserted at the front, so later `first` chunks end
//!    up before earlier ones.
//! 3. Each `last` chunk is appended.
//! 4. Relative chunks (`before:X` / `after:X`) are placed next to `X` in a
//!    single pass, in their original order. `X` is looked up in the sequence
//!    as built so far, including earlier relative insertions. A missing
//!    target appends the chunk at the end.

use std::sync::Arc;

use super::chunk::{Chunk, OrderRule};
use super::stage::Stage;

#[must_use]
pub fn sort_chunks(chunks: &[Arc<Chunk>], stage: Stage) -> Vec<Arc<Chunk>> {
    let mut sequence: Vec<Arc<Chunk>> = Vec::with_capacity(chunks.len());
    let mut first = Vec::new();
    let mut last = Vec::new();
    let mut relative = Vec::new();

    for chunk in chunks {
        match chunk.order_rule(stage) {
            None => sequence.push(Arc::clone(chunk)),
            Some(OrderRule::First) => first.push(chunk),
            Some(OrderRule::Last) => last.push(chunk),
            Some(rule) => relative.push((chunk, rule)),
        }
    }

    for chunk in first {
        sequence.insert(0, Arc::clone(chunk));
    }
    sequence.extend(last.into_iter().cloned());

    for (chunk, rule) in relative {
        let (target, offset) = match rule {
            OrderRule::Before(target) => (target, 0),
            OrderRule::After(target) => (target, 1),
            OrderRule::First | OrderRule::Last => continue,
        };
        match sequence.iter().position(|c| c.name() == target) {
            Some(pos) => sequence.insert(pos + offset, Arc::clone(chunk)),
            None => {
                log::debug!(
                    "Chunk '{}' orders against missing '{target}' in {stage} stage; appending",
                    chunk.name()
                );
                sequence.push(Arc::clone(chunk));
            }
        }
    }

    sequence
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(name: &str, rule: &str) -> Arc<Chunk> {
        Arc::new(Chunk::new(name, format!("@fragment({rule}) {{{{ {name}(); }}}}")))
    }

    fn names(sorted: &[Arc<Chunk>]) -> Vec<&str> {
        sorted.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn test_first_none_last() {
        let input = [chunk("c", "last"), chunk("b", ""), chunk("a", "first")];
        assert_eq!(names(&sort_chunks(&input, Stage::Fragment)), ["a", "b", "c"]);
    }

    #[test]
    fn test_later_first_goes_before_earlier_first() {
        let input = [chunk("f1", "first"), chunk("n", ""), chunk("f2", "first")];
        assert_eq!(names(&sort_chunks(&input, Stage::Fragment)), ["f2", "f1", "n"]);
    }

    #[test]
    fn test_later_last_goes_after_earlier_last() {
        let input = [chunk("l1", "last"), chunk("l2", "last"), chunk("n", "")];
        assert_eq!(names(&sort_chunks(&input, Stage::Fragment)), ["n", "l1", "l2"]);
    }

    #[test]
    fn test_before_target() {
        let input = [
            chunk("a", ""),
            chunk("b", ""),
            chunk("c", ""),
            chunk("x", "before:b"),
        ];
        assert_eq!(names(&sort_chunks(&input, Stage::Fragment)), ["a", "x", "b", "c"]);
    }

    #[test]
    fn test_after_target() {
        let input = [chunk("x", "after:a"), chunk("a", ""), chunk("b", "")];
        assert_eq!(names(&sort_chunks(&input, Stage::Fragment)), ["a", "x", "b"]);
    }

    #[test]
    fn test_missing_target_appends() {
        let input = [
            chunk("a", ""),
            chunk("x", "before:b"),
            chunk("c", "last"),
        ];
        assert_eq!(names(&sort_chunks(&input, Stage::Fragment)), ["a", "c", "x"]);
    }

    #[test]
    fn test_relative_sees_earlier_relative_insertions() {
        let input = [
            chunk("a", ""),
            chunk("x", "after:a"),
            chunk("y", "after:x"),
            chunk("z", "before:w"),
            chunk("w", "after:y"),
        ];
        // `z` is resolved before `w` is placed, so it falls back to the end.
        assert_eq!(
            names(&sort_chunks(&input, Stage::Fragment)),
            ["a", "x", "y", "w", "z"]
        );
    }

    #[test]
    fn test_rules_are_per_stage() {
        let input = [
            Arc::new(Chunk::new("p", "@vertex(last) {{ p(); }} @fragment {{ p(); }}")),
            Arc::new(Chunk::new("q", "@vertex {{ q(); }} @fragment(last) {{ q(); }}")),
        ];
        assert_eq!(names(&sort_chunks(&input, Stage::Vertex)), ["q", "p"]);
        assert_eq!(names(&sort_chunks(&input, Stage::Fragment)), ["p", "q"]);
    }
}
