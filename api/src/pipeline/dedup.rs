use log::debug;
use std::{collections::HashSet, hash::Hash};

use super::{spawn_stage, Context};
use crate::stream::Stream;

/// Forward the first occurrence of every value of `input`, in input order.
pub fn dedup<T>(context: &Context, input: Stream<T>) -> Stream<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    let (sink, output) = context.channel();

    spawn_stage(context, "dedup", move || {
        let mut seen = HashSet::new();
        for value in input {
            if seen.insert(value.clone()) && sink.send(value).is_err() {
                return;
            }
        }
        debug!("Deduplicated stream complete with {} distinct values", seen.len());
    });

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::Tally;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dedup_keeps_first_occurrences() {
        let context = Context::new();
        let input = context.stream_from_iter(vec![1u64, 3, 2, 1, 4, 3, 3, 2, 1]);
        let output: Vec<_> = dedup(&context, input).collect();
        assert_eq!(output, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_dedup_empty() {
        let context = Context::new();
        let input = context.stream_from_iter(Vec::<u64>::new());
        assert_eq!(dedup(&context, input).count(), 0);
    }

    #[test]
    fn test_dropping_output_stops_stage() {
        let context = Context::new();
        let tally = Tally::default();
        let input = context.stream_from_iter(tally.endless());
        let mut output = dedup(&context, input);
        assert_eq!(output.next(), Some(0));
        assert_eq!(output.next(), Some(1));
        drop(output);

        // The stage exits on its next send, dropping its input and so the producer.
        assert!(tally.wait_released());
        assert!(tally.count() <= 4, "{} values read", tally.count());
    }
}
