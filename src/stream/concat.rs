//! Ordered concatenation of byte streams.
//!
//! Sources are drained strictly one after another. The current source is only
//! polled when the consumer polls, so a slow consumer pauses every upstream.
//! The first error is forwarded and ends the stream; later sources are
//! dropped unpolled.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::Stream;

use super::ByteStream;

/// Stream emitting each source in full, in order.
pub struct Concat {
    sources: VecDeque<ByteStream>,
}

impl Concat {
    pub fn new(sources: impl IntoIterator<Item = ByteStream>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
        }
    }
}

impl Stream for Concat {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        while let Some(current) = this.sources.front_mut() {
            match ready!(current.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => return Poll::Ready(Some(Ok(chunk))),
                Some(Err(err)) => {
                    this.sources.clear();
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    this.sources.pop_front();
                }
            }
        }

        Poll::Ready(None)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.sources.is_empty() {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}

/// Join `sources` into one stream.
///
/// Zero sources complete immediately; a single source is returned as is.
pub fn concat(mut sources: Vec<ByteStream>) -> ByteStream {
    if sources.len() == 1
        && let Some(only) = sources.pop()
    {
        return only;
    }
    Box::pin(Concat::new(sources))
}
