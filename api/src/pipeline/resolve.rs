use crossbeam_channel::{bounded, select};
use log::{debug, error};
use scoped_threadpool::Pool;
use std::mem;

use super::{check_batch_size, spawn_stage, Context, Truncation};
use crate::{
    error::{Error, Result},
    resources::user::Id,
    retry::{Retrier, RetryConfig},
    stream::{Sink, Stream},
};

/// Ids per lookup request, kept below the API limit of 100.
pub const DEFAULT_BATCH_SIZE: usize = 95;

/// Lookup requests in flight at once.
pub const DEFAULT_RESOLVER_THREADS: u32 = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveOptions {
    batch_size: usize,
    threads: u32,
}

impl ResolveOptions {
    pub fn new(batch_size: usize, threads: u32) -> Result<Self> {
        check_batch_size(batch_size)?;
        if threads == 0 {
            return Err(Error::BadPipelineOption {
                message: "at least one resolver thread is required".to_owned(),
            });
        }
        Ok(Self {
            batch_size,
            threads,
        })
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            threads: DEFAULT_RESOLVER_THREADS,
        }
    }
}

/// Resolve a stream of ids in batches, merging the results of all batches into one stream.
///
/// Ids are accumulated into batches of `options.batch_size`; every full batch, and the
/// final partial one if any, is looked up on a pool of `options.threads` workers. At most
/// one batch per worker is queued or in flight, so ids are only read as fast as they are
/// looked up. The output ends once the input has ended and every lookup has been
/// forwarded. Results of different batches interleave in no particular order.
///
/// Dropping the output stops the stage: no further batch is looked up and the input is
/// dropped, which in turn stops its producer.
pub fn resolve<N, L>(
    context: &Context,
    ids: Stream<Id>,
    options: &ResolveOptions,
    retry: &RetryConfig,
    lookup: L,
) -> Stream<N>
where
    N: Send + 'static,
    L: Fn(&[Id]) -> Result<Vec<N>> + Send + Sync + 'static,
{
    let (sink, output) = context.channel();
    let batch_size = options.batch_size;
    let mut pool = Pool::new(options.threads);
    // One slot per batch queued on or running in the pool.
    let (take_slot, free_slot) = bounded::<()>(options.threads as usize);
    let retrier = Retrier::new(retry.clone());
    let stage_context = context.clone();

    spawn_stage(context, "resolve", move || {
        let (context, retrier, lookup, sink) = (&stage_context, &retrier, &lookup, &sink);
        let free_slot = &free_slot;
        let mut num_batches = 0usize;

        pool.scoped(|scope| {
            let mut dispatch = |batch: Vec<Id>| -> bool {
                if sink.is_closed() {
                    return false;
                }
                let has_slot = select! {
                    send(take_slot, ()) -> sent => sent.is_ok(),
                    recv(context.cancellation().signal()) -> _ => false,
                };
                // The output may have been dropped while waiting for a slot.
                if !has_slot || sink.is_closed() {
                    return false;
                }
                num_batches += 1;
                scope.execute(move || {
                    resolve_batch(context, retrier, lookup, sink, batch);
                    let _ = free_slot.try_recv();
                });
                true
            };

            let mut batch = Vec::with_capacity(batch_size);
            for id in ids {
                batch.push(id);
                if batch.len() >= batch_size {
                    let full = mem::replace(&mut batch, Vec::with_capacity(batch_size));
                    if !dispatch(full) {
                        debug!("Resolve stopped early, dropping its input");
                        return;
                    }
                }
            }
            if !batch.is_empty() {
                dispatch(batch);
            }
        });

        // Every worker has been joined by the scope; the output ends when `sink` drops.
        debug!("Resolved {} batches", num_batches);
    });

    output
}

fn resolve_batch<N, L>(
    context: &Context,
    retrier: &Retrier,
    lookup: &L,
    sink: &Sink<N>,
    batch: Vec<Id>,
) where
    L: Fn(&[Id]) -> Result<Vec<N>>,
{
    if sink.is_closed() {
        return;
    }
    debug!("Looking up a batch of {} ids", batch.len());
    match retrier.with_retries(context.cancellation(), || lookup(&batch)) {
        Ok(names) => {
            for name in names {
                if sink.send(name).is_err() {
                    return;
                }
            }
        }
        Err(Error::Cancelled) => {}
        Err(error) => {
            error!("Lookup of {} ids failed: {}", batch.len(), error);
            context.record(Truncation {
                source: format!(
                    "lookup of {} ids starting with {}",
                    batch.len(),
                    batch[0]
                ),
                reason: error.to_string(),
            });
        }
    }
}
