use crossbeam_channel::{never, select};
use log::debug;
use std::{collections::HashSet, hash::Hash};

use super::{spawn_stage, Context};
use crate::stream::{Sink, Stream};

/// Emit every value seen on both `first` and `second`.
///
/// Both inputs are drained as they become ready, so a fast input never waits for a slow
/// one. A value is emitted each time it arrives on one side after having been seen on the
/// other, so the output may repeat values; compose with [`dedup`](super::dedup) for a set.
/// The output ends once both inputs have ended.
///
/// A single thread reads both inputs, so while a common value waits for the consumer
/// neither input is read: a slow consumer throttles both inputs alike. Outside of that
/// the inputs never wait on each other.
pub fn intersect<T>(context: &Context, first: Stream<T>, second: Stream<T>) -> Stream<T>
where
    T: Eq + Hash + Clone + Send + 'static,
{
    let (sink, output) = context.channel();
    let cancel = context.cancellation().clone();

    spawn_stage(context, "intersect", move || {
        let closed = never();

        let mut seen_first = HashSet::new();
        let mut seen_second = HashSet::new();
        let (mut first_open, mut second_open) = (true, true);

        while first_open || second_open {
            let first_receiver = if first_open { first.receiver() } else { &closed };
            let second_receiver = if second_open { second.receiver() } else { &closed };

            let delivered = select! {
                recv(first_receiver) -> value => match value {
                    Ok(value) => arrive(value, &mut seen_first, &seen_second, &sink),
                    Err(_) => {
                        first_open = false;
                        true
                    }
                },
                recv(second_receiver) -> value => match value {
                    Ok(value) => arrive(value, &mut seen_second, &seen_first, &sink),
                    Err(_) => {
                        second_open = false;
                        true
                    }
                },
                recv(cancel.signal()) -> _ => false,
            };
            if !delivered {
                return;
            }
        }

        debug!(
            "Intersection complete after {} and {} distinct values",
            seen_first.len(),
            seen_second.len()
        );
    });

    output
}

/// Record `value` on its own side and emit it if the other side already has it. Returns
/// `false` once the output can no longer be written to.
fn arrive<T>(value: T, own: &mut HashSet<T>, other: &HashSet<T>, sink: &Sink<T>) -> bool
where
    T: Eq + Hash + Clone,
{
    own.insert(value.clone());
    !other.contains(&value) || sink.send(value).is_ok()
}
