/// A macro to simplify read-through caching of recommendation batches.
///
/// This macro checks if a fresh batch is present in the cache.
/// If found, it returns the cached batch.
/// If not found, it executes the provided block to compute the batch,
/// stores it in the cache, and then returns the computed batch.
///
/// Cache failures never short-circuit; only an error from the block does.
///
/// # Arguments
/// * `$cache`: The [`RecommendationCache`](crate::db::RecommendationCache) to use.
/// * `$key`: The fingerprint key for the batch.
/// * `$block`: The future to await if the batch is not found in cache.
///
/// # Example
/// ```rust,ignore
/// let records = cached!(cache, key, async move {
///     generate_recommendations().await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        if let Some(cached) = $cache.get(&$key).await {
            Ok(cached)
        } else {
            // If not in cache, execute the block to compute the value
            let value = $block.await?;
            $cache.put(&$key, &value).await;
            Ok(value)
        }
    }};
}
