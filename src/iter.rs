//! Blocking iteration over async streams

use futures::{Stream, StreamExt};

use crate::bridge::Bridge;

/// Pull-based sync view of an async stream.
///
/// Each `next` runs one advance on the runtime thread; nothing is buffered
/// or read ahead, so the stream may be finite or infinite. Once the stream
/// reports exhaustion it is dropped and the iterator stays empty.
pub struct BlockingIter<'a, S> {
    bridge: &'a Bridge,
    stream: Option<S>,
}

impl<'a, S> BlockingIter<'a, S> {
    pub(crate) fn new(bridge: &'a Bridge, stream: S) -> Self {
        Self {
            bridge,
            stream: Some(stream),
        }
    }
}

impl<S> Iterator for BlockingIter<'_, S>
where
    S: Stream + Send + Unpin + 'static,
    S::Item: Send + 'static,
{
    type Item = S::Item;

    fn next(&mut self) -> Option<S::Item> {
        // The stream rides along with each submitted future so the future
        // stays 'static; it comes back with the element.
        let mut stream = self.stream.take()?;
        let (item, stream) = self.bridge.run(async move {
            let item = stream.next().await;
            (item, stream)
        });
        match item {
            Some(value) => {
                self.stream = Some(stream);
                Some(value)
            }
            None => None,
        }
    }
}
