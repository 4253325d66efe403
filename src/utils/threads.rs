use futures::StreamExt;
use futures::stream;
use std::future::Future;

/// Run the given futures with at most `limit` in flight at once, returning
/// results in completion order. Callers that need input association must
/// carry a key inside each future's output.
pub async fn do_parallel_with_limit<F, T>(futures: Vec<F>, limit: usize) -> Vec<T>
where
    F: Future<Output = T>,
{
    stream::iter(futures)
        .buffer_unordered(limit.max(1))
        .collect()
        .await
}
