use std::future::Future;

use anyhow::Result;
use log::debug;

/// Fetch skip-based pages until the indexer runs dry.
///
/// `fetch_page` receives the running `skip` offset. A page shorter than
/// `page_size` is the last one; an empty page counts as short, so an indexer
/// that keeps answering never loops forever unless it returns full pages.
/// With `limit`, paging also stops once at least `limit` items are gathered
/// (the last page is kept whole).
pub async fn paginate<T, F, Fut>(page_size: usize, limit: Option<usize>, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items: Vec<T> = Vec::new();
    let mut skip = 0;

    loop {
        let page = fetch_page(skip).await?;
        let page_len = page.len();
        items.extend(page);
        skip += page_size;

        if page_len < page_size {
            break;
        }
        if limit.is_some_and(|limit| items.len() >= limit) {
            debug!("Pagination stopped at limit after {} items", items.len());
            break;
        }
    }

    Ok(items)
}
