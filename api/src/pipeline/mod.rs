//! Streaming computation of the followers two accounts have in common.
//!
//! Each stage runs on its own thread and hands values downstream through a
//! [`Stream`](crate::stream::Stream):
//!
//! ```text
//! follower_ids(a) --\
//!                    intersect --> dedup --> resolve --> screen names
//! follower_ids(b) --/
//! ```
//!
//! Nothing is ever collected in memory beyond the per-stage sets of ids seen so far.

mod dedup;
mod intersect;
mod resolve;
mod source;

use log::error;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::Duration,
};

use crate::{
    error::{Error, Result},
    resources::{
        follower::{Cursor, FollowerIdPage, FollowerPage},
        user::{Id, ScreenName},
    },
    retry::RetryConfig,
    stream::{self, CancellationToken, Sink, Stream},
    MAX_LOOKUP_BATCH_SIZE,
};

pub use self::{
    dedup::dedup,
    intersect::intersect,
    resolve::{resolve, ResolveOptions, DEFAULT_BATCH_SIZE, DEFAULT_RESOLVER_THREADS},
    source::{paginate, Page},
};

/// The remote capabilities the pipeline is built on.
pub trait FollowerSource {
    fn follower_page(&self, screen_name: &ScreenName, cursor: &Cursor) -> Result<FollowerPage>;

    fn follower_id_page(&self, screen_name: &ScreenName, cursor: &Cursor)
        -> Result<FollowerIdPage>;

    /// Resolve ids to screen names. Callers never pass more than `MAX_LOOKUP_BATCH_SIZE` ids.
    fn lookup_screen_names(&self, ids: &[Id]) -> Result<Vec<ScreenName>>;
}

impl<S: FollowerSource + ?Sized> FollowerSource for Arc<S> {
    fn follower_page(&self, screen_name: &ScreenName, cursor: &Cursor) -> Result<FollowerPage> {
        (**self).follower_page(screen_name, cursor)
    }

    fn follower_id_page(
        &self,
        screen_name: &ScreenName,
        cursor: &Cursor,
    ) -> Result<FollowerIdPage> {
        (**self).follower_id_page(screen_name, cursor)
    }

    fn lookup_screen_names(&self, ids: &[Id]) -> Result<Vec<ScreenName>> {
        (**self).lookup_screen_names(ids)
    }
}

/// A stream which ended early because a request failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Truncation {
    /// What was being streamed, e.g. "followers/ids of `jack`".
    pub source: String,
    pub reason: String,
}

impl Display for Truncation {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{} stopped early: {}", self.source, self.reason)
    }
}

/// State shared by all the stages of one pipeline: the cancellation signal and the
/// report of streams which were cut short.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancel: CancellationToken,
    truncations: Arc<Mutex<Vec<Truncation>>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn channel<T>(&self) -> (Sink<T>, Stream<T>) {
        stream::channel(&self.cancel)
    }

    /// Feed the values of `values` into a new stream from a dedicated thread.
    pub fn stream_from_iter<I>(&self, values: I) -> Stream<I::Item>
    where
        I: IntoIterator + Send + 'static,
        I::Item: Send + 'static,
    {
        let (sink, stream) = self.channel();
        spawn_stage(self, "from-iter", move || {
            for value in values {
                if sink.send(value).is_err() {
                    return;
                }
            }
        });
        stream
    }

    pub fn record(&self, truncation: Truncation) {
        self.truncations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(truncation);
    }

    /// Every truncation recorded so far. Only complete once all streams are drained.
    pub fn truncations(&self) -> Vec<Truncation> {
        self.truncations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn spawn_stage(context: &Context, name: &str, stage: impl FnOnce() + Send + 'static) {
    spawn_stage_with(context, thread::Builder::new(), name, stage)
}

fn spawn_stage_with(
    context: &Context,
    builder: thread::Builder,
    name: &str,
    stage: impl FnOnce() + Send + 'static,
) {
    if let Err(error) = builder.name(name.to_owned()).spawn(stage) {
        error!("Could not start `{}` thread: {}", name, error);
        context.record(Truncation {
            source: name.to_owned(),
            reason: error.to_string(),
        });
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of ids per lookup request.
    pub batch_size: usize,
    /// Number of lookup requests in flight at once.
    pub resolver_threads: u32,
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            resolver_threads: DEFAULT_RESOLVER_THREADS,
            retry: RetryConfig::default(),
        }
    }
}

/// Entry point composing the stages on top of a [`FollowerSource`].
pub struct Pipeline<S> {
    source: Arc<S>,
    resolve_options: ResolveOptions,
    retry: RetryConfig,
    context: Context,
}

impl<S> Pipeline<S>
where
    S: FollowerSource + Send + Sync + 'static,
{
    pub fn new(source: S, config: PipelineConfig) -> Result<Self> {
        let PipelineConfig {
            batch_size,
            resolver_threads,
            retry,
        } = config;
        Ok(Self {
            source: Arc::new(source),
            resolve_options: ResolveOptions::new(batch_size, resolver_threads)?,
            retry,
            context: Context::new(),
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Stop every stage started by this pipeline. Open streams end immediately.
    pub fn cancel(&self) {
        self.context.cancel();
    }

    /// Cancel the pipeline once `timeout` has elapsed.
    pub fn cancel_after(&self, timeout: Duration) {
        self.context.cancellation().cancel_after(timeout);
    }

    /// Streams which ended early because of a failed request.
    pub fn truncations(&self) -> Vec<Truncation> {
        self.context.truncations()
    }

    /// Ids of all the followers of `screen_name`, in listing order.
    pub fn follower_ids(&self, screen_name: &ScreenName) -> Stream<Id> {
        let source = Arc::clone(&self.source);
        let screen_name = screen_name.clone();
        paginate(
            &self.context,
            format!("followers/ids of `{screen_name}`"),
            &self.retry,
            move |cursor| {
                source
                    .follower_id_page(&screen_name, cursor)
                    .map(Page::from)
            },
        )
    }

    /// Screen names of all the followers of `screen_name`, in listing order.
    pub fn follower_screen_names(&self, screen_name: &ScreenName) -> Stream<ScreenName> {
        let source = Arc::clone(&self.source);
        let screen_name = screen_name.clone();
        paginate(
            &self.context,
            format!("followers/list of `{screen_name}`"),
            &self.retry,
            move |cursor| source.follower_page(&screen_name, cursor).map(Page::from),
        )
    }

    /// Ids following both accounts, each exactly once, in no particular order.
    pub fn common_follower_ids(&self, first: &ScreenName, second: &ScreenName) -> Stream<Id> {
        dedup(
            &self.context,
            intersect(
                &self.context,
                self.follower_ids(first),
                self.follower_ids(second),
            ),
        )
    }

    /// Screen names of the given ids, in no particular order.
    pub fn screen_names(&self, ids: Stream<Id>) -> Stream<ScreenName> {
        let source = Arc::clone(&self.source);
        resolve(
            &self.context,
            ids,
            &self.resolve_options,
            &self.retry,
            move |batch: &[Id]| source.lookup_screen_names(batch),
        )
    }
}

impl From<FollowerIdPage> for Page<Id> {
    fn from(page: FollowerIdPage) -> Self {
        Page {
            items: page.followers,
            next_cursor: page.next_cursor,
        }
    }
}

impl From<FollowerPage> for Page<ScreenName> {
    fn from(page: FollowerPage) -> Self {
        Page {
            items: page
                .followers
                .into_iter()
                .map(|user| user.screen_name)
                .collect(),
            next_cursor: page.next_cursor,
        }
    }
}

fn check_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 || batch_size > MAX_LOOKUP_BATCH_SIZE {
        return Err(Error::BadPipelineOption {
            message: format!(
                "batch size must be between 1 and {MAX_LOOKUP_BATCH_SIZE}, got {batch_size}"
            ),
        });
    }
    Ok(())
}
