use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, Stream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::server::{
    dtos::playlist_dto::PlaylistRequest,
    services::fetch_services::{DynPlaylistFetcher, FetchError},
    utils::{
        m3u_utils::rewrite_playlist, merge_utils::PlaylistMerger, rewrite_utils::RewriteContext,
    },
};

type SourceResult = Result<Vec<String>, FetchError>;

/// Builds the combined playlist: one worker per source downloads and rewrites, the output
/// stream then merges the results strictly in request order.
pub struct PlaylistService {
    fetcher: DynPlaylistFetcher,
}

impl PlaylistService {
    pub fn new(fetcher: DynPlaylistFetcher) -> Self {
        Self { fetcher }
    }

    /// Starts every source right away and returns the merged output, one chunk per source.
    ///
    /// Dropping the stream (client went away) drops the workers with it, nothing keeps
    /// downloading in the background.
    pub fn combined_stream(
        &self,
        request: PlaylistRequest,
    ) -> impl Stream<Item = Result<String, Infallible>> + Send + 'static {
        let context = Arc::new(request.rewrite_context());
        let urls: Vec<String> = request
            .sources
            .into_iter()
            .map(|source| source.playlist_url)
            .collect();

        info!(
            "combining {} playlists (base url {})",
            urls.len(),
            context.base_url
        );

        let mut workers = JoinSet::new();
        for (index, url) in urls.iter().enumerate() {
            workers.spawn(Self::run_source(
                index,
                url.clone(),
                self.fetcher.clone(),
                context.clone(),
            ));
        }

        let state = CombineState {
            slots: vec![None; urls.len()],
            urls,
            workers,
            next: 0,
            merger: PlaylistMerger::new(),
            finished: false,
        };

        futures::stream::unfold(state, |mut state| async move {
            let chunk = state.next_chunk().await?;
            Some((Ok(chunk), state))
        })
    }

    async fn run_source(
        index: usize,
        url: String,
        fetcher: DynPlaylistFetcher,
        context: Arc<RewriteContext>,
    ) -> (usize, SourceResult) {
        let pipeline = async {
            let lines = fetcher.fetch_lines(&url).await?;
            let rewritten = rewrite_playlist(&lines, &context);
            debug!("rewrote {} lines from {}", rewritten.len(), url);
            Ok::<_, FetchError>(rewritten)
        };

        // a panicking source shouldn't take the others down or leave its slot empty
        let result = AssertUnwindSafe(pipeline)
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Internal {
                    url: url.clone(),
                    message: "playlist worker panicked".to_string(),
                })
            });

        (index, result)
    }
}

struct CombineState {
    urls: Vec<String>,
    slots: Vec<Option<SourceResult>>,
    workers: JoinSet<(usize, SourceResult)>,
    next: usize,
    merger: PlaylistMerger,
    finished: bool,
}

impl CombineState {
    async fn next_chunk(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }

        if self.next == self.urls.len() {
            self.finished = true;
            return self.merger.finish();
        }

        let result = self.wait_for_slot(self.next).await;
        let url = &self.urls[self.next];
        self.next += 1;

        let chunk = match result {
            Ok(lines) => self.merger.push_segment(&lines),
            Err(e) => {
                warn!("skipping playlist {}: {}", url, e);
                self.merger.push_error(url, &e)
            }
        };

        Some(chunk)
    }

    // results arrive in completion order, park them until it's their turn
    async fn wait_for_slot(&mut self, index: usize) -> SourceResult {
        loop {
            if let Some(result) = self.slots[index].take() {
                return result;
            }

            match self.workers.join_next().await {
                Some(Ok((finished, result))) => self.slots[finished] = Some(result),
                Some(Err(e)) => error!("playlist worker failed: {}", e),
                None => {
                    error!("no worker left for playlist {}", self.urls[index]);
                    return Err(FetchError::Internal {
                        url: self.urls[index].clone(),
                        message: "playlist worker was lost".to_string(),
                    });
                }
            }
        }
    }
}
