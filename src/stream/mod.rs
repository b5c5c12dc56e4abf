//! Byte streams feeding the response pipeline.

mod concat;

use std::io;
use std::path::PathBuf;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, stream};
use tokio::io::AsyncReadExt;

pub use concat::{Concat, concat};

/// Boxed stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

const CHUNK_SIZE: usize = 64 * 1024;

/// Stream yielding `bytes` as a single chunk.
pub fn once(bytes: impl Into<Bytes>) -> ByteStream {
    Box::pin(stream::once(std::future::ready(Ok(bytes.into()))))
}

enum FileSource {
    Closed(PathBuf),
    Open(tokio::fs::File),
}

/// Stream the file at `path` in fixed-size chunks.
///
/// The file is opened on first poll; open and read errors surface as stream
/// items.
pub fn file(path: impl Into<PathBuf>) -> ByteStream {
    let start = FileSource::Closed(path.into());
    Box::pin(stream::try_unfold(start, |source| async move {
        let mut file = match source {
            FileSource::Closed(path) => tokio::fs::File::open(&path).await?,
            FileSource::Open(file) => file,
        };

        let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
        let read = file.read_buf(&mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok::<_, io::Error>(Some((buf.freeze(), FileSource::Open(file))))
    }))
}

/// Drain a stream into one buffer, stopping at the first error.
pub async fn collect(mut stream: ByteStream) -> io::Result<Bytes> {
    let mut out = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out.freeze())
}
