//! Hand a finished bundle to a storage publisher or the local disk.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::Serialize;
use tracing::{error, info};
use trend_models::{Category, PosterBundle, Rendition};
use trend_storage::{bundle_prefix, rendition_key, upload_options, StoragePublisher};

use crate::error::{WorkerError, WorkerResult};
use crate::retry::{retry_when, RetryConfig};

/// One uploaded rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedImage {
    pub rendition: Rendition,
    pub key: String,
    pub url: String,
}

/// Upload every rendition of `bundle` concurrently, retrying transient
/// storage errors. Returns the public URLs in rendition order.
pub async fn publish_bundle(
    publisher: &dyn StoragePublisher,
    bundle: &PosterBundle,
    date: NaiveDate,
    retry: &RetryConfig,
) -> WorkerResult<Vec<PublishedImage>> {
    let prefix = bundle_prefix(bundle, date);

    let uploads = bundle.images.iter().map(|image| {
        let key = rendition_key(&prefix, image);
        let options = upload_options(bundle, image);
        async move {
            let url = retry_when(
                retry,
                || publisher.upload(image.bytes.clone(), &key, options.clone()),
                |e| e.is_retryable(),
            )
            .await
            .map_err(|e| {
                WorkerError::upload_failed(format!("{key} failed after {} attempts: {}", e.attempts, e.error))
            })?;
            Ok::<_, WorkerError>(PublishedImage {
                rendition: image.rendition,
                key,
                url,
            })
        }
    });

    let published = try_join_all(uploads).await?;
    info!(
        category = %bundle.category,
        candidate = %bundle.candidate.key(),
        prefix = %prefix,
        count = published.len(),
        "Published poster bundle"
    );
    Ok(published)
}

/// Write every rendition plus `bundle.json` under `dir/<category>/`.
/// Returns the category directory.
pub async fn write_bundle(dir: &Path, bundle: &PosterBundle) -> WorkerResult<PathBuf> {
    let target = dir.join(bundle.category.as_str());
    tokio::fs::create_dir_all(&target).await?;

    for image in &bundle.images {
        let file = format!("{}.{}", image.rendition.as_str(), image.encoding.extension());
        tokio::fs::write(target.join(file), &image.bytes).await?;
    }
    tokio::fs::write(target.join("bundle.json"), serde_json::to_vec_pretty(bundle)?).await?;
    Ok(target)
}

/// Where finished bundles go: a local directory, a publisher, or both.
pub struct Delivery<'a> {
    pub out_dir: Option<&'a Path>,
    pub publisher: Option<&'a dyn StoragePublisher>,
    pub date: NaiveDate,
    pub retry: &'a RetryConfig,
}

impl Delivery<'_> {
    /// Write, then publish, one bundle.
    pub async fn deliver(&self, bundle: &PosterBundle) -> WorkerResult<()> {
        if let Some(dir) = self.out_dir {
            let path = write_bundle(dir, bundle).await?;
            info!(category = %bundle.category, path = %path.display(), "Poster written");
        }
        if let Some(publisher) = self.publisher {
            let published = publish_bundle(publisher, bundle, self.date, self.retry).await?;
            for image in &published {
                info!(
                    category = %bundle.category,
                    rendition = image.rendition.as_str(),
                    url = %image.url,
                    "Poster published"
                );
            }
        }
        Ok(())
    }

    /// Deliver every bundle. A failed bundle is logged and skipped; the
    /// categories that failed are returned in order.
    pub async fn deliver_all(&self, bundles: &[PosterBundle]) -> Vec<Category> {
        let mut failed = Vec::new();
        for bundle in bundles {
            if let Err(e) = self.deliver(bundle).await {
                error!(category = %bundle.category, "Delivering poster failed: {}", e);
                failed.push(bundle.category);
            }
        }
        failed
    }
}
