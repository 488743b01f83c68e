use tabled::Table;

use crate::{
    config::PipelineConfig,
    error,
    pipeline::{PageFetcher, RetryExecutor, RetryPolicy},
    types::{Artist, Cursor},
    utils, warning,
};

use super::{cancel_on_ctrl_c, spotify_client};

/// Prints up to `limit` artists matching `query`, most relevant first.
pub async fn search(query: String, limit: usize, config: PipelineConfig) {
    let client = spotify_client().await;
    let cancel = cancel_on_ctrl_c();
    let retry = RetryExecutor::new(RetryPolicy::from(&config));

    let pb = utils::spinner(format!("Searching artists matching '{query}'..."));

    let (client, retry, cancel, query_ref) = (&client, &retry, &cancel, query.as_str());
    let mut pages = PageFetcher::new(move |cursor: Option<Cursor>| async move {
        retry
            .run(cancel, "artist search", || {
                client.search_artists(query_ref, cursor.as_ref())
            })
            .await
    });

    let mut artists: Vec<Artist> = Vec::new();
    while artists.len() < limit {
        match pages.next_page().await {
            Ok(Some(batch)) => artists.extend(batch),
            Ok(None) => break,
            Err(e) => {
                pb.finish_and_clear();
                error!("Artist search failed. Err: {}", e);
            }
        }
    }
    artists.truncate(limit);
    pb.finish_and_clear();

    log::debug!(
        "artist search used {} requests for {} results",
        pages.requests_made(),
        artists.len()
    );

    if artists.is_empty() {
        warning!("No artists found for '{}'", query);
        return;
    }

    println!("{}", Table::new(utils::artist_table_rows(artists)));
}
