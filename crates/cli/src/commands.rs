//! CLI subcommands.

use crate::model::{self, Album, Photo, User};
use clap::Subcommand;
use eyre::WrapErr;
use picfetch_core::FetchedBytes;
use picfetch_task::{CompletionReceiver, FetchScheduler};
use std::collections::HashMap;

#[derive(Subcommand)]
pub enum Commands {
    /// List all users
    Users,
    /// List photo albums, optionally only those of one user
    Albums {
        /// Only show albums belonging to this user id
        #[arg(long)]
        user: Option<u64>,
    },
    /// List the photos of one album
    Photos {
        /// Album id to list photos for
        #[arg(long)]
        album: u64,
        /// Also download this many thumbnails through the cache
        #[arg(long, default_value_t = 0)]
        thumbnails: usize,
    },
    /// Fetch one URL and write the raw payload to stdout
    Get { url: String },
}

/// Scheduler plus the single consumer end of its completion channel.
///
/// All completions are drained here, on the command's task; nothing else ever
/// reads fetch results.
pub struct App {
    pub scheduler: FetchScheduler,
    pub completions: CompletionReceiver,
    pub base_url: String,
}

impl App {
    /// Fetch one URL and wait for its completion.
    async fn fetch_one(&mut self, url: &str) -> eyre::Result<FetchedBytes> {
        let handle = self
            .scheduler
            .fetch(url)
            .wrap_err_with(|| format!("failed to schedule fetch of {url}"))?;
        loop {
            let completion = self
                .completions
                .recv()
                .await
                .ok_or_else(|| eyre::eyre!("scheduler shut down before delivering a result"))?;
            // With batched fetches in flight, results for other tasks can
            // arrive first; only one caller drains this channel, so they
            // cannot belong to anyone else and are safe to drop on error
            // paths.
            if completion.id == handle.id() {
                return completion
                    .outcome
                    .wrap_err_with(|| format!("fetching {url} failed"));
            }
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn execute(mut self, command: Commands) -> eyre::Result<()> {
        match command {
            Commands::Users => {
                let url = self.endpoint("users");
                let fetched = self.fetch_one(&url).await?;
                let users: Vec<User> = model::decode_list(&fetched.bytes)?;
                tracing::info!(
                    count = users.len(),
                    from_cache = fetched.from_cache,
                    "loaded users"
                );
                for user in &users {
                    println!("{:>3}  {user}", user.id);
                }
            }
            Commands::Albums { user } => {
                let url = self.endpoint("albums");
                let fetched = self.fetch_one(&url).await?;
                let albums: Vec<Album> = model::decode_list(&fetched.bytes)?;
                let shown: Vec<&Album> = match user {
                    Some(user_id) => model::albums_for_user(&albums, user_id),
                    None => albums.iter().collect(),
                };
                for album in shown {
                    println!("{:>3}  (user {})  {}", album.id, album.user_id, album.title);
                }
            }
            Commands::Photos { album, thumbnails } => {
                let url = self.endpoint("photos");
                let fetched = self.fetch_one(&url).await?;
                let photos: Vec<Photo> = model::decode_list(&fetched.bytes)?;
                let in_album: Vec<Photo> = model::photos_for_album(&photos, album)
                    .into_iter()
                    .cloned()
                    .collect();
                for photo in &in_album {
                    println!("{:>5}  {}", photo.id, photo.title);
                }
                if thumbnails > 0 {
                    self.download_thumbnails(&in_album, thumbnails).await?;
                }
            }
            Commands::Get { url } => {
                let fetched = self.fetch_one(&url).await?;
                tracing::info!(
                    bytes = fetched.bytes.len(),
                    from_cache = fetched.from_cache,
                    "fetched resource"
                );
                use std::io::Write;
                std::io::stdout().write_all(&fetched.bytes)?;
            }
        }
        Ok(())
    }

    /// Download up to `limit` thumbnails concurrently, reporting each as its
    /// completion arrives. Order across tasks is whatever the workers finish
    /// in.
    async fn download_thumbnails(&mut self, photos: &[Photo], limit: usize) -> eyre::Result<()> {
        let mut pending = HashMap::new();
        for photo in photos.iter().take(limit) {
            let handle = self.scheduler.fetch(&photo.thumbnail_url)?;
            pending.insert(handle.id(), photo.id);
        }

        while !pending.is_empty() {
            let completion = self
                .completions
                .recv()
                .await
                .ok_or_else(|| eyre::eyre!("scheduler shut down mid-download"))?;
            let Some(photo_id) = pending.remove(&completion.id) else {
                continue;
            };
            match completion.outcome {
                Ok(fetched) => {
                    println!(
                        "thumbnail {photo_id}: {} bytes{}",
                        fetched.bytes.len(),
                        if fetched.from_cache { " (cached)" } else { "" }
                    );
                }
                Err(e) => {
                    tracing::warn!(photo_id, "thumbnail download failed: {e}");
                }
            }
        }
        Ok(())
    }
}
