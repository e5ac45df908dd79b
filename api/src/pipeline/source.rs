use log::{debug, error};

use super::{spawn_stage, Context, Truncation};
use crate::{
    error::{Error, Result},
    resources::follower::Cursor,
    retry::{Retrier, RetryConfig},
    stream::Stream,
};

/// One page of a cursored listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Cursor,
}

/// Stream every item of a cursored listing, one page at a time.
///
/// Starts from [`Cursor::start`] and follows `next_cursor` until the remote signals the
/// last page. Throttled pages are repeated with the same cursor after the cooldown. Any
/// other failure ends the stream early and is recorded as a [`Truncation`].
pub fn paginate<T, F>(
    context: &Context,
    label: impl Into<String>,
    retry: &RetryConfig,
    mut fetch: F,
) -> Stream<T>
where
    T: Send + 'static,
    F: FnMut(&Cursor) -> Result<Page<T>> + Send + 'static,
{
    let (sink, stream) = context.channel();
    let label = label.into();
    let retrier = Retrier::new(retry.clone());
    let stage_context = context.clone();

    spawn_stage(context, "paginate", move || {
        let context = stage_context;
        let mut cursor = Cursor::start();
        let mut num_pages = 0usize;

        while !cursor.is_exhausted() {
            let page = match retrier.with_retries(context.cancellation(), || fetch(&cursor)) {
                Ok(page) => page,
                Err(Error::Cancelled) => {
                    debug!("Listing {} cancelled at cursor `{}`", label, cursor);
                    return;
                }
                Err(error) => {
                    error!("Listing {} stopped at cursor `{}`: {}", label, cursor, error);
                    context.record(Truncation {
                        source: label,
                        reason: error.to_string(),
                    });
                    return;
                }
            };
            num_pages += 1;

            for item in page.items {
                if let Err(closed) = sink.send(item) {
                    debug!("Listing {} abandoned: {}", label, closed);
                    return;
                }
            }
            cursor = page.next_cursor;
        }

        debug!("Listing {} complete after {} pages", label, num_pages);
    });

    stream
}
